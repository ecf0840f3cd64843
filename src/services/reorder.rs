// src/services/reorder.rs

// Reordenação da lista de departamentos por arrastar-e-soltar.
// Independente do gesto: a entrada é sempre o par (arrastado, alvo).
//
// Idle -> Dragging -> { Dropped-Valid, Dropped-Invalid } -> Idle

use uuid::Uuid;

use crate::models::department::{Department, SortOrderUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { active: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDrop {
    NotDragging,
    SameTarget,
    BeforePinnedAll,
    PinnedSource,
    UnknownRow(Uuid),
}

/// Resultado de um drop válido: a nova ordem e as posições a gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    pub ordered: Vec<Department>,
    pub updates: Vec<SortOrderUpdate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Valid(ReorderPlan),
    Invalid(InvalidDrop),
}

#[derive(Debug)]
pub struct ReorderEngine {
    state: DragState,
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self { state: DragState::Idle }
    }
}

impl ReorderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Só linhas não fixas podem ser arrastadas.
    pub fn begin(&mut self, rows: &[Department], active: Uuid) -> Result<(), InvalidDrop> {
        let row = rows.iter().find(|d| d.id == active).ok_or(InvalidDrop::UnknownRow(active))?;
        if row.is_pinned() {
            return Err(InvalidDrop::PinnedSource);
        }
        self.state = DragState::Dragging { active };
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Solta sobre `over`. Sempre volta para `Idle`.
    pub fn drop_on(&mut self, rows: &[Department], over: Uuid) -> DropOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging { active } = state else {
            return DropOutcome::Invalid(InvalidDrop::NotDragging);
        };
        match plan_move(rows, active, over) {
            Ok(plan) => DropOutcome::Valid(plan),
            Err(invalid) => DropOutcome::Invalid(invalid),
        }
    }
}

/// Ordem de exibição: "all" primeiro, depois sort_order crescente.
/// Empates ficam na ordem original da lista (ordenação estável).
pub fn display_order(rows: &[Department]) -> Vec<Department> {
    let mut ordered = rows.to_vec();
    ordered.sort_by_key(|d| (!d.is_all(), d.sort_order));
    ordered
}

pub fn plan_move(rows: &[Department], active: Uuid, over: Uuid) -> Result<ReorderPlan, InvalidDrop> {
    let mut ordered = display_order(rows);

    let from = ordered.iter().position(|d| d.id == active).ok_or(InvalidDrop::UnknownRow(active))?;
    let to = ordered.iter().position(|d| d.id == over).ok_or(InvalidDrop::UnknownRow(over))?;

    if from == to {
        return Err(InvalidDrop::SameTarget);
    }
    if ordered[from].is_pinned() {
        return Err(InvalidDrop::PinnedSource);
    }
    if to == 0 && ordered[0].is_all() {
        return Err(InvalidDrop::BeforePinnedAll);
    }

    let moved = ordered.remove(from);
    ordered.insert(to, moved);

    // "all" volta para o topo, aconteça o que acontecer
    if let Some(pos) = ordered.iter().position(Department::is_all) {
        if pos != 0 {
            let all = ordered.remove(pos);
            ordered.insert(0, all);
        }
    }

    // Renumera 1..N só as linhas móveis; as fixas mantêm o valor gravado
    let mut updates = Vec::new();
    for row in ordered.iter_mut().filter(|d| !d.is_pinned()) {
        let sort_order = updates.len() as i32 + 1;
        row.sort_order = sort_order;
        updates.push(SortOrderUpdate { id: row.id, sort_order });
    }

    // A lista otimista fica igual ao que uma releitura devolveria
    Ok(ReorderPlan { ordered: display_order(&ordered), updates })
}
