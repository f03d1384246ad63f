//! TUI application state and key handling.
//!
//! Key handling is synchronous and only decides what to do; anything that
//! talks to the API comes back as an [`Action`], which the event loop runs
//! after drawing the busy indicator.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rust_decimal::Decimal;

use stockwright_api::models::RawMaterialInput;
use stockwright_core::Acknowledged;
use stockwright_core::catalog;
use stockwright_core::composition::CompositionRow;
use stockwright_core::orchestrator::CreationError;
use stockwright_core::production::PlanState;
use stockwright_core::selection::{Modal, SelectionError, Workbench};

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Materials,
    Products,
    Plan,
    Help,
}

impl View {
    pub const TABS: [View; 3] = [View::Materials, View::Products, View::Plan];

    pub fn title(self) -> &'static str {
        match self {
            Self::Materials => "Raw Materials",
            Self::Products => "Products",
            Self::Plan => "Production Plan",
            Self::Help => "Help",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Materials => Self::Products,
            Self::Products => Self::Plan,
            Self::Plan | Self::Help => Self::Materials,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Materials | Self::Help => Self::Plan,
            Self::Products => Self::Materials,
            Self::Plan => Self::Products,
        }
    }
}

/// Single-line text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
}

impl TextInput {
    pub fn with(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    fn handle(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.value.push(c),
            KeyCode::Backspace => {
                self.value.pop();
            }
            _ => {}
        }
    }

    fn decimal(&self) -> Option<Decimal> {
        self.value.trim().parse().ok()
    }
}

/// Which part of the product dialog receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogFocus {
    /// Code, name or value (create dialog only).
    Field(usize),
    Rows,
    Material,
    Quantity,
}

pub const PRODUCT_FIELDS: [&str; 3] = ["Code", "Name", "Value"];
pub const MATERIAL_FIELDS: [&str; 3] = ["Code", "Name", "Stock"];

/// Screen state of the product dialog; the dialog itself lives in the
/// workbench modal.
#[derive(Debug, Clone)]
pub struct DialogState {
    pub fields: [TextInput; 3],
    pub focus: DialogFocus,
    pub row: usize,
    /// Index into the material list for the "add" line.
    pub material: usize,
    pub quantity: TextInput,
    /// Text of the row being edited inline.
    pub row_edit: Option<TextInput>,
}

impl DialogState {
    fn creating() -> Self {
        Self {
            fields: Default::default(),
            focus: DialogFocus::Field(0),
            row: 0,
            material: 0,
            quantity: TextInput::default(),
            row_edit: None,
        }
    }

    fn editing() -> Self {
        Self {
            focus: DialogFocus::Rows,
            ..Self::creating()
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterialForm {
    /// `None` when registering a new material.
    pub id: Option<i64>,
    pub fields: [TextInput; 3],
    pub focus: usize,
}

/// Work that needs the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    LoadPlan,
    RefreshPlan,
    SaveMaterial,
    DeleteMaterial(i64),
    DeleteProduct(i64),
    SubmitCreation,
    AddRow { raw_material_id: i64, quantity: Decimal },
    CommitRow { row: usize, quantity: Decimal },
    RemoveRow(usize),
}

/// A destructive action waiting for y/n.
#[derive(Debug, Clone)]
pub struct PendingConfirm {
    pub prompt: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub error: bool,
}

/// Application state for the TUI.
pub struct App {
    pub bench: Workbench,
    pub view: View,
    previous_view: View,
    pub selected_material: usize,
    pub selected_product: usize,
    pub dialog: DialogState,
    pub material_form: Option<MaterialForm>,
    pub confirm: Option<PendingConfirm>,
    pub status: Option<Status>,
    /// Label of the action currently waiting on the API.
    pub busy: Option<&'static str>,
    pub tick_rate: Duration,
    pub should_quit: bool,
}

impl App {
    pub fn new(bench: Workbench) -> Self {
        Self {
            bench,
            view: View::Materials,
            previous_view: View::Materials,
            selected_material: 0,
            selected_product: 0,
            dialog: DialogState::editing(),
            material_form: None,
            confirm: None,
            status: None,
            busy: None,
            tick_rate: Duration::from_millis(250),
            should_quit: false,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: true,
        });
    }

    pub fn selected_material_id(&self) -> Option<i64> {
        let materials = self.bench.store().materials();
        materials.items().get(self.selected_material).map(|m| m.id)
    }

    pub fn selected_product_id(&self) -> Option<i64> {
        let products = self.bench.store().products();
        products.items().get(self.selected_product).map(|p| p.id)
    }

    /// Rows of the open dialog's composition, with display names filled in.
    pub fn dialog_rows(&self) -> Vec<CompositionRow> {
        let Some(editor) = self.bench.editor() else {
            return Vec::new();
        };
        editor
            .rows()
            .into_iter()
            .map(|mut row| {
                if row.raw_material_name.is_none() {
                    row.raw_material_name = self.bench.store().material_name(row.raw_material_id);
                }
                row
            })
            .collect()
    }

    fn clamp_selection(&mut self) {
        let materials = self.bench.store().materials().len();
        let products = self.bench.store().products().len();
        self.selected_material = self.selected_material.min(materials.saturating_sub(1));
        self.selected_product = self.selected_product.min(products.saturating_sub(1));
        let rows = self.bench.editor().map(|e| e.rows().len()).unwrap_or(0);
        self.dialog.row = self.dialog.row.min(rows.saturating_sub(1));
        self.bench.select(self.selected_product_id());
    }

    // -- Keys --

    /// Apply a key press. Returns the API work it asks for, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }
        self.status = None;

        if let Some(pending) = self.confirm.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                return Some(pending.action);
            }
            self.info("Cancelled.");
            return None;
        }
        if self.material_form.is_some() {
            return self.material_form_key(key);
        }
        if !self.bench.modal().is_idle() {
            return self.dialog_key(key);
        }
        self.browse_key(key)
    }

    fn browse_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.view == View::Help {
                    self.view = self.previous_view;
                } else {
                    self.should_quit = true;
                }
                None
            }
            KeyCode::Char('?') => {
                if self.view != View::Help {
                    self.previous_view = self.view;
                    self.view = View::Help;
                }
                None
            }
            KeyCode::Tab => self.switch_view(self.view.next()),
            KeyCode::BackTab => self.switch_view(self.view.prev()),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('r') => match self.view {
                View::Plan if self.bench.production().is_refresh_enabled() => {
                    Some(Action::RefreshPlan)
                }
                View::Materials | View::Products => Some(Action::Refresh),
                _ => None,
            },
            KeyCode::Char('n') => {
                match self.view {
                    View::Materials => {
                        self.material_form = Some(MaterialForm {
                            id: None,
                            fields: Default::default(),
                            focus: 0,
                        });
                    }
                    View::Products => match self.bench.open_create() {
                        Ok(_) => self.dialog = DialogState::creating(),
                        Err(e) => self.error(e.to_string()),
                    },
                    _ => {}
                }
                None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                match self.view {
                    View::Materials => self.open_material_form(),
                    View::Products => {
                        if let Some(id) = self.selected_product_id() {
                            match self.bench.open_editor(id) {
                                Ok(()) => self.dialog = DialogState::editing(),
                                Err(e) => self.error(e.to_string()),
                            }
                        }
                    }
                    _ => {}
                }
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                match self.view {
                    View::Materials => {
                        if let Some(m) = self
                            .bench
                            .store()
                            .materials()
                            .items()
                            .get(self.selected_material)
                        {
                            self.confirm = Some(PendingConfirm {
                                prompt: format!("Delete raw material {} ({})?", m.name, m.code),
                                action: Action::DeleteMaterial(m.id),
                            });
                        }
                    }
                    View::Products => {
                        if let Some(p) = self
                            .bench
                            .store()
                            .products()
                            .items()
                            .get(self.selected_product)
                        {
                            self.confirm = Some(PendingConfirm {
                                prompt: format!("Delete product {} ({})?", p.name, p.code),
                                action: Action::DeleteProduct(p.id),
                            });
                        }
                    }
                    _ => {}
                }
                None
            }
            _ => None,
        }
    }

    fn switch_view(&mut self, view: View) -> Option<Action> {
        self.view = view;
        (view == View::Plan).then_some(Action::LoadPlan)
    }

    fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.view {
            View::Materials => (
                &mut self.selected_material,
                self.bench.store().materials().len(),
            ),
            View::Products => (
                &mut self.selected_product,
                self.bench.store().products().len(),
            ),
            _ => return,
        };
        *index = step(*index, delta, len);
        self.bench.select(self.selected_product_id());
    }

    fn open_material_form(&mut self) {
        let materials = self.bench.store().materials();
        if let Some(m) = materials.items().get(self.selected_material) {
            self.material_form = Some(MaterialForm {
                id: Some(m.id),
                fields: [
                    TextInput::with(m.code.clone()),
                    TextInput::with(m.name.clone()),
                    TextInput::with(m.stock_quantity.to_string()),
                ],
                focus: 0,
            });
        }
    }

    fn material_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let form = self.material_form.as_mut()?;
        let save = key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            _ if save => return Some(Action::SaveMaterial),
            KeyCode::Esc => self.material_form = None,
            KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % form.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = (form.focus + form.fields.len() - 1) % form.fields.len();
            }
            KeyCode::Enter if form.focus + 1 < form.fields.len() => form.focus += 1,
            KeyCode::Enter => return Some(Action::SaveMaterial),
            code => form.fields[form.focus].handle(code),
        }
        None
    }

    fn dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.dialog.row_edit.is_some() {
            return self.row_edit_key(key);
        }
        let creating = matches!(self.bench.modal(), Modal::Creating(_));
        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return creating.then(|| self.sync_create_fields()).flatten();
        }

        match (key.code, self.dialog.focus) {
            (KeyCode::Esc, _) => {
                self.bench.close();
                self.dialog = DialogState::editing();
                None
            }
            (KeyCode::Tab, focus) => {
                self.dialog.focus = cycle_focus(focus, creating, true);
                None
            }
            (KeyCode::BackTab, focus) => {
                self.dialog.focus = cycle_focus(focus, creating, false);
                None
            }
            (code, DialogFocus::Field(i)) => {
                if code == KeyCode::Enter {
                    self.dialog.focus = cycle_focus(DialogFocus::Field(i), creating, true);
                } else {
                    self.dialog.fields[i].handle(code);
                }
                None
            }
            (KeyCode::Char('j') | KeyCode::Down, DialogFocus::Rows) => {
                let len = self.dialog_rows().len();
                self.dialog.row = step(self.dialog.row, 1, len);
                None
            }
            (KeyCode::Char('k') | KeyCode::Up, DialogFocus::Rows) => {
                let len = self.dialog_rows().len();
                self.dialog.row = step(self.dialog.row, -1, len);
                None
            }
            (KeyCode::Char('e') | KeyCode::Enter, DialogFocus::Rows) => {
                let row = self.dialog.row;
                let Some(editor) = self.bench.active_editor() else {
                    return None;
                };
                match editor.begin_edit(row) {
                    Ok(edit) => {
                        self.dialog.row_edit = Some(TextInput::with(edit.quantity.to_string()));
                    }
                    Err(e) => self.error(e.to_string()),
                }
                None
            }
            (KeyCode::Char('d') | KeyCode::Delete, DialogFocus::Rows) => {
                let row = self.dialog.row;
                let rows = self.dialog_rows();
                let entry = rows.get(row)?;
                if creating {
                    return Some(Action::RemoveRow(row));
                }
                let name = entry
                    .raw_material_name
                    .clone()
                    .unwrap_or_else(|| format!("material {}", entry.raw_material_id));
                self.confirm = Some(PendingConfirm {
                    prompt: format!("Remove {name} from this product?"),
                    action: Action::RemoveRow(row),
                });
                None
            }
            (KeyCode::Left | KeyCode::Char('h'), DialogFocus::Material) => {
                let len = self.bench.store().materials().len();
                self.dialog.material = step(self.dialog.material, -1, len);
                None
            }
            (KeyCode::Right | KeyCode::Char('l'), DialogFocus::Material) => {
                let len = self.bench.store().materials().len();
                self.dialog.material = step(self.dialog.material, 1, len);
                None
            }
            (KeyCode::Enter, DialogFocus::Material | DialogFocus::Quantity) => self.add_row(),
            (code, DialogFocus::Quantity) => {
                self.dialog.quantity.handle(code);
                None
            }
            _ => None,
        }
    }

    fn row_edit_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                if let Some(editor) = self.bench.active_editor() {
                    editor.cancel_edit();
                }
                self.dialog.row_edit = None;
                None
            }
            KeyCode::Enter => {
                let row = self.bench.editor().and_then(|e| e.editing()).map(|e| e.row)?;
                match self.dialog.row_edit.as_ref().and_then(TextInput::decimal) {
                    Some(quantity) => Some(Action::CommitRow { row, quantity }),
                    None => {
                        self.error("Quantity must be a number.");
                        None
                    }
                }
            }
            code => {
                if let Some(input) = self.dialog.row_edit.as_mut() {
                    input.handle(code);
                }
                None
            }
        }
    }

    fn add_row(&mut self) -> Option<Action> {
        let materials = self.bench.store().materials();
        let Some(material) = materials.items().get(self.dialog.material) else {
            self.error("There are no raw materials to add.");
            return None;
        };
        let Some(quantity) = self.dialog.quantity.decimal() else {
            self.error("Quantity must be a number.");
            return None;
        };
        Some(Action::AddRow {
            raw_material_id: material.id,
            quantity,
        })
    }

    /// Copy the create dialog's text fields into the session input.
    fn sync_create_fields(&mut self) -> Option<Action> {
        let Some(value) = self.dialog.fields[2].decimal() else {
            self.error("Value must be a number.");
            return None;
        };
        let session = self.bench.creation_mut()?;
        session.input.code = self.dialog.fields[0].value.trim().to_string();
        session.input.name = self.dialog.fields[1].value.trim().to_string();
        session.input.value = value;
        Some(Action::SubmitCreation)
    }

    // -- Actions --

    /// Mark `action` as in flight before the API is called.
    pub fn begin(&mut self, action: &Action) {
        self.busy = Some(match action {
            Action::Refresh => "Refreshing",
            Action::LoadPlan | Action::RefreshPlan => "Loading plan",
            Action::SubmitCreation => "Creating product",
            Action::DeleteMaterial(_) | Action::DeleteProduct(_) => "Deleting",
            _ => "Saving",
        });
        match action {
            Action::LoadPlan if *self.bench.production().state() == PlanState::NotLoaded => {
                self.bench.production_mut().begin_refresh();
            }
            Action::RefreshPlan => {
                self.bench.production_mut().begin_refresh();
            }
            _ => {}
        }
    }

    /// Run `action` against the API and fold the outcome into the screen.
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::Refresh => {
                match self.bench.store().refresh_all(self.bench.gateway()).await {
                    Ok(()) => self.info("Refreshed."),
                    Err(e) => self.error(format!("Refresh failed: {e}")),
                }
            }
            Action::LoadPlan | Action::RefreshPlan => {
                if *self.bench.production().state() == PlanState::Loading {
                    let result = self.bench.gateway().production_suggestion().await;
                    self.bench.production_mut().finish_refresh(result);
                }
            }
            Action::SaveMaterial => self.save_material().await,
            Action::DeleteMaterial(id) => {
                let result = catalog::delete_material(
                    self.bench.gateway(),
                    self.bench.store(),
                    id,
                    &Acknowledged,
                )
                .await;
                match result {
                    Ok(()) => self.info("Raw material deleted."),
                    Err(e) => self.error(e.to_string()),
                }
            }
            Action::DeleteProduct(id) => match self.bench.delete_product(id, &Acknowledged).await {
                Ok(()) => self.info("Product deleted."),
                Err(e) => self.error(e.to_string()),
            },
            Action::SubmitCreation => self.submit_creation().await,
            Action::AddRow {
                raw_material_id,
                quantity,
            } => {
                let Some(editor) = self.bench.active_editor() else {
                    return self.finish();
                };
                match editor.add(raw_material_id, quantity).await {
                    Ok(()) => {
                        self.dialog.quantity = TextInput::default();
                        self.info("Raw material added.");
                    }
                    Err(e) => self.error(e.to_string()),
                }
            }
            Action::CommitRow { row, quantity } => {
                let Some(editor) = self.bench.active_editor() else {
                    return self.finish();
                };
                match editor.commit_edit(row, quantity).await {
                    Ok(()) => {
                        self.dialog.row_edit = None;
                        self.info("Quantity updated.");
                    }
                    Err(e) => self.error(e.to_string()),
                }
            }
            Action::RemoveRow(row) => {
                let Some(editor) = self.bench.active_editor() else {
                    return self.finish();
                };
                match editor.remove(row, &Acknowledged).await {
                    Ok(()) => {
                        if editor.editing().is_none() {
                            self.dialog.row_edit = None;
                        }
                        self.info("Raw material removed.");
                    }
                    Err(e) => self.error(e.to_string()),
                }
            }
        }
        self.finish();
    }

    /// [`Self::begin`] then [`Self::perform`], without a redraw between.
    pub async fn dispatch(&mut self, action: Action) {
        self.begin(&action);
        self.perform(action).await;
    }

    fn finish(&mut self) {
        self.busy = None;
        self.clamp_selection();
    }

    async fn save_material(&mut self) {
        let Some(form) = self.material_form.clone() else {
            return;
        };
        let Some(stock_quantity) = form.fields[2].decimal() else {
            self.error("Stock must be a number.");
            return;
        };
        let input = RawMaterialInput {
            code: form.fields[0].value.trim().to_string(),
            name: form.fields[1].value.trim().to_string(),
            stock_quantity,
        };
        let gateway = self.bench.gateway();
        let store = self.bench.store();
        let result = match form.id {
            Some(id) => catalog::update_material(gateway, store, id, &input).await,
            None => catalog::create_material(gateway, store, &input).await,
        };
        match result {
            Ok(material) => {
                self.material_form = None;
                self.info(format!("Saved raw material {}.", material.code));
            }
            Err(e) => self.error(e.to_string()),
        }
    }

    async fn submit_creation(&mut self) {
        match self.bench.submit_creation().await {
            Ok(product) => {
                self.dialog = DialogState::editing();
                self.view = View::Products;
                if let Some(index) = self
                    .bench
                    .store()
                    .products()
                    .items()
                    .iter()
                    .position(|p| p.id == product.id)
                {
                    self.selected_product = index;
                }
                self.info(format!(
                    "Created product {} with {} raw materials.",
                    product.code,
                    product.composition.len()
                ));
            }
            Err(SelectionError::Creation(err @ CreationError::AttachFailed { .. })) => {
                // The workbench switched to editing the new product.
                self.dialog = DialogState::editing();
                self.error(format!("{err}. Finish the composition here."));
            }
            Err(e) => self.error(e.to_string()),
        }
    }
}

/// Move `index` by `delta` within `0..len`, clamping at both ends.
fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.saturating_add_signed(delta).min(len - 1)
}

fn cycle_focus(focus: DialogFocus, creating: bool, forward: bool) -> DialogFocus {
    let order: &[DialogFocus] = if creating {
        &[
            DialogFocus::Field(0),
            DialogFocus::Field(1),
            DialogFocus::Field(2),
            DialogFocus::Rows,
            DialogFocus::Material,
            DialogFocus::Quantity,
        ]
    } else {
        &[DialogFocus::Rows, DialogFocus::Material, DialogFocus::Quantity]
    };
    let pos = order.iter().position(|f| *f == focus).unwrap_or(0);
    let next = if forward {
        (pos + 1) % order.len()
    } else {
        (pos + order.len() - 1) % order.len()
    };
    order[next]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
