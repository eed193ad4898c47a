//! Quantity synchronisation: rewrite `params.quantity` of every order entry
//! whose `instrument.tradingsymbol` appears in the quantity map.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::order::{
    json_kind, trading_symbol, EntryShapeError, OrderDocument, PARAMS_KEY, QUANTITY_KEY,
};
use crate::quantity::QuantityMap;

/// An entry that could not be processed. The entry is left unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryWarning {
    /// Position of the entry in the document (0-based).
    pub index: usize,
    pub symbol: Option<String>,
    pub message: String,
}

impl std::fmt::Display for EntryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "entry {} ({}): {}", self.index, symbol, self.message),
            None => write!(f, "entry {}: {}", self.index, self.message),
        }
    }
}

/// Result of one synchronisation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOutcome {
    pub document: OrderDocument,
    /// Entries whose quantity was written.
    pub updated_count: usize,
    pub warnings: Vec<EntryWarning>,
}

enum EntryAction {
    Unchanged,
    Updated(Value),
}

/// Apply `quantities` to every entry of `document`.
///
/// The input is not modified. The returned document has the same length and
/// order; only `params.quantity` of matched entries differs. Entries with an
/// unexpected shape are reported in `warnings` and passed through unchanged.
pub fn synchronize(document: &OrderDocument, quantities: &QuantityMap) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    let mut entries = Vec::with_capacity(document.len());

    for (index, entry) in document.entries().iter().enumerate() {
        match sync_entry(entry, quantities) {
            Ok(EntryAction::Updated(updated)) => {
                outcome.updated_count += 1;
                entries.push(updated);
            }
            Ok(EntryAction::Unchanged) => entries.push(entry.clone()),
            Err(e) => {
                let warning = EntryWarning {
                    index,
                    symbol: trading_symbol(entry).ok().flatten().map(str::to_string),
                    message: e.to_string(),
                };
                warn!(%warning, "Skipping order entry");
                outcome.warnings.push(warning);
                entries.push(entry.clone());
            }
        }
    }

    debug!(
        entries = entries.len(),
        updated = outcome.updated_count,
        warnings = outcome.warnings.len(),
        "Order document synchronized"
    );
    outcome.document = OrderDocument::new(entries);
    outcome
}

fn sync_entry(entry: &Value, quantities: &QuantityMap) -> Result<EntryAction, EntryShapeError> {
    let Some(symbol) = trading_symbol(entry)? else {
        return Ok(EntryAction::Unchanged);
    };
    let Some(quantity) = quantities.get(symbol) else {
        return Ok(EntryAction::Unchanged);
    };
    // trading_symbol succeeded, so the entry is an object
    let Some(params) = entry.get(PARAMS_KEY) else {
        return Ok(EntryAction::Unchanged);
    };
    if !params.is_object() {
        return Err(EntryShapeError::ParamsNotAnObject(json_kind(params)));
    }

    let mut updated = entry.clone();
    if let Some(params) = updated.get_mut(PARAMS_KEY).and_then(Value::as_object_mut) {
        params.insert(QUANTITY_KEY.to_string(), Value::from(quantity));
    }
    Ok(EntryAction::Updated(updated))
}
