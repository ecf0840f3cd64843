// src/common/i18n.rs

use serde::Serialize;

use crate::db::Table;

/// Chaves das mensagens exibidas ao usuário (toasts, feed e erros da API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Created,
    Updated,
    Deleted,
    Uploaded,
    Reordered,
    Reassigned,
    ValidationFailed,
    DuplicateDepartmentCode,
    PinnedDepartment,
    UnknownDepartment,
    RemoteWriteFailed,
    RemoteReadFailed,
    ConfirmationDenied,
    NotFound,
    SubmissionInProgress,
    Cancelled,
    StorageFailed,
    Internal,
}

/// Uma mensagem ainda não traduzida: chave + entidade + sujeito.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub key: MessageKey,
    #[serde(skip)]
    pub table: Option<Table>,
    pub subject: Option<String>,
}

impl Message {
    pub fn new(key: MessageKey) -> Self {
        Self { key, table: None, subject: None }
    }

    pub fn about(key: MessageKey, table: Table, subject: impl Into<String>) -> Self {
        Self { key, table: Some(table), subject: Some(subject.into()) }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Pt,
    Zh,
}

impl Lang {
    /// "pt-BR" -> Pt, "zh-TW" -> Zh. Desconhecido -> None.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.split('-').next().unwrap_or(tag).to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Lang::En),
            "pt" => Some(Lang::Pt),
            "zh" => Some(Lang::Zh),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct I18nStore {
    fallback: Lang,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self { fallback: Lang::En }
    }
}

impl I18nStore {
    pub fn new(fallback: Lang) -> Self {
        Self { fallback }
    }

    pub fn lang(&self, locale: &str) -> Lang {
        Lang::from_tag(locale).unwrap_or(self.fallback)
    }

    pub fn text(&self, locale: &str, key: MessageKey) -> &'static str {
        template(self.lang(locale), key)
    }

    pub fn entity_label(&self, locale: &str, table: Table) -> &'static str {
        entity_label(self.lang(locale), table)
    }

    pub fn render(&self, locale: &str, message: &Message) -> String {
        let lang = self.lang(locale);
        let entity = message.table.map(|t| entity_label(lang, t)).unwrap_or("");
        template(lang, message.key)
            .replace("{entity}", entity)
            .replace("{subject}", message.subject.as_deref().unwrap_or(""))
    }
}

fn entity_label(lang: Lang, table: Table) -> &'static str {
    use Table::*;
    match (lang, table) {
        (Lang::En, Customers) => "Customer",
        (Lang::En, Departments) => "Department",
        (Lang::En, PaymentRecords) => "Payment record",
        (Lang::En, ServicePlans) => "Service plan",
        (Lang::En, AdvertisingPlans) => "Advertising plan",
        (Lang::En, CustomerFiles) => "File",

        (Lang::Pt, Customers) => "Cliente",
        (Lang::Pt, Departments) => "Departamento",
        (Lang::Pt, PaymentRecords) => "Registro de pagamento",
        (Lang::Pt, ServicePlans) => "Plano de serviço",
        (Lang::Pt, AdvertisingPlans) => "Plano de anúncios",
        (Lang::Pt, CustomerFiles) => "Arquivo",

        (Lang::Zh, Customers) => "客戶",
        (Lang::Zh, Departments) => "部門",
        (Lang::Zh, PaymentRecords) => "付款紀錄",
        (Lang::Zh, ServicePlans) => "服務方案",
        (Lang::Zh, AdvertisingPlans) => "廣告方案",
        (Lang::Zh, CustomerFiles) => "檔案",
    }
}

fn template(lang: Lang, key: MessageKey) -> &'static str {
    use MessageKey::*;
    match lang {
        Lang::En => match key {
            Created => "{entity} \"{subject}\" created.",
            Updated => "{entity} \"{subject}\" updated.",
            Deleted => "{entity} \"{subject}\" deleted.",
            Uploaded => "File \"{subject}\" uploaded.",
            Reordered => "Department order saved.",
            Reassigned => "Customers moved to \"{subject}\".",
            ValidationFailed => "One or more fields are invalid.",
            DuplicateDepartmentCode => "Department code \"{subject}\" already exists.",
            PinnedDepartment => "Department \"{subject}\" is fixed and cannot be changed.",
            UnknownDepartment => "Department \"{subject}\" does not exist.",
            RemoteWriteFailed => "Could not save the changes. Please try again.",
            RemoteReadFailed => "Could not load data from the server.",
            ConfirmationDenied => "Incorrect confirmation password.",
            NotFound => "Record not found.",
            SubmissionInProgress => "This record is already being saved.",
            Cancelled => "Operation cancelled.",
            StorageFailed => "File storage failed.",
            Internal => "An unexpected error occurred.",
        },
        Lang::Pt => match key {
            Created => "{entity} \"{subject}\" criado.",
            Updated => "{entity} \"{subject}\" atualizado.",
            Deleted => "{entity} \"{subject}\" excluído.",
            Uploaded => "Arquivo \"{subject}\" enviado.",
            Reordered => "Ordem dos departamentos salva.",
            Reassigned => "Clientes movidos para \"{subject}\".",
            ValidationFailed => "Um ou mais campos são inválidos.",
            DuplicateDepartmentCode => "O código de departamento \"{subject}\" já existe.",
            PinnedDepartment => "O departamento \"{subject}\" é fixo e não pode ser alterado.",
            UnknownDepartment => "O departamento \"{subject}\" não existe.",
            RemoteWriteFailed => "Não foi possível salvar as alterações. Tente novamente.",
            RemoteReadFailed => "Não foi possível carregar os dados do servidor.",
            ConfirmationDenied => "Senha de confirmação incorreta.",
            NotFound => "Registro não encontrado.",
            SubmissionInProgress => "Este registro já está sendo salvo.",
            Cancelled => "Operação cancelada.",
            StorageFailed => "Falha no armazenamento do arquivo.",
            Internal => "Ocorreu um erro inesperado.",
        },
        Lang::Zh => match key {
            Created => "已新增{entity}「{subject}」。",
            Updated => "已更新{entity}「{subject}」。",
            Deleted => "已刪除{entity}「{subject}」。",
            Uploaded => "已上傳檔案「{subject}」。",
            Reordered => "部門順序已儲存。",
            Reassigned => "客戶已移至「{subject}」。",
            ValidationFailed => "有欄位格式不正確。",
            DuplicateDepartmentCode => "部門代碼「{subject}」已存在。",
            PinnedDepartment => "部門「{subject}」為固定項目，無法變更。",
            UnknownDepartment => "部門「{subject}」不存在。",
            RemoteWriteFailed => "儲存失敗，請再試一次。",
            RemoteReadFailed => "無法從伺服器載入資料。",
            ConfirmationDenied => "確認密碼錯誤。",
            NotFound => "找不到資料。",
            SubmissionInProgress => "此筆資料正在儲存中。",
            Cancelled => "操作已取消。",
            StorageFailed => "檔案儲存失敗。",
            Internal => "發生未預期的錯誤。",
        },
    }
}
