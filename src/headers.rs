//! Resolution of free-form sheet headers to canonical fields.
//!
//! The alias table is plain data; [`HeaderMap::resolve`] is the only place that
//! matches header text. Matching runs in two passes over every field: exact
//! (normalized) matches first, then substring matches for the fields still
//! unresolved. A header is claimed by at most one field, so an exact match is
//! never shadowed by another field's substring alias.

use csv::StringRecord;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::types::Field;
use crate::util::normalize_header;

/// Built-in aliases, in priority order per field.
pub static DEFAULT_ALIASES: Lazy<AliasTable> = Lazy::new(|| {
    AliasTable::empty()
        .with_aliases(Field::Date, ["date", "day", "report date"])
        .with_aliases(Field::Channel, ["channel", "platform", "source"])
        .with_aliases(Field::Campaign, ["campaign", "campaign name"])
        .with_aliases(Field::Spend, ["ad spend", "spend", "amount spent", "cost"])
        .with_aliases(Field::Impressions, ["impressions", "impr"])
        .with_aliases(Field::Clicks, ["clicks", "click", "link clicks"])
        .with_aliases(Field::Leads, ["leads", "lead"])
        .with_aliases(Field::Booked, ["leads booked", "booked calls", "booked"])
        .with_aliases(Field::ShowUps, ["show-ups", "show ups", "showups", "show"])
        .with_aliases(
            Field::QualifiedCalls,
            [
                "qualified calls",
                "sales calls (tagged qualified)",
                "sales calls (qualified leads)",
            ],
        )
        .with_aliases(Field::DealsClosed, ["deals closed", "deal closed", "deals"])
        .with_aliases(Field::Revenue, ["revenue (booked)", "revenue"])
        .with_aliases(
            Field::CashIn,
            [
                "cash-in (collected)",
                "cash in (collected)",
                "cash collected",
                "cash-in",
                "cash in",
            ],
        )
});

/// Accepted header spellings for each canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTable {
    aliases: Vec<Vec<String>>,
}

impl AliasTable {
    /// A table where no field has any alias.
    pub fn empty() -> Self {
        AliasTable {
            aliases: vec![Vec::new(); Field::COUNT],
        }
    }

    /// Replace the alias list of one field. Aliases are normalized the same
    /// way headers are; blanks are dropped.
    pub fn with_aliases<I, S>(mut self, field: Field, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases[field.index()] = aliases
            .into_iter()
            .map(|a| normalize_header(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    pub fn aliases(&self, field: Field) -> &[String] {
        &self.aliases[field.index()]
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        DEFAULT_ALIASES.clone()
    }
}

/// Canonical field → source column index.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    headers: Vec<String>,
    columns: [Option<usize>; Field::COUNT],
}

impl HeaderMap {
    pub fn resolve<S: AsRef<str>>(headers: &[S], table: &AliasTable) -> Self {
        let raw: Vec<String> = headers.iter().map(|h| h.as_ref().trim().to_string()).collect();
        let normalized: Vec<String> = raw.iter().map(|h| normalize_header(h)).collect();
        let mut columns = [None; Field::COUNT];
        let mut claimed = vec![false; normalized.len()];

        let passes: [fn(&str, &str) -> bool; 2] = [|h, a| h == a, |h, a| h.contains(a)];
        for is_match in passes {
            for field in Field::ALL {
                if columns[field.index()].is_some() {
                    continue;
                }
                let hit = table.aliases(field).iter().find_map(|alias| {
                    normalized
                        .iter()
                        .enumerate()
                        .find(|(i, h)| !claimed[*i] && is_match(h, alias))
                        .map(|(i, _)| i)
                });
                if let Some(i) = hit {
                    debug!(field = %field, header = %raw[i], "resolved column");
                    claimed[i] = true;
                    columns[field.index()] = Some(i);
                }
            }
        }

        HeaderMap {
            headers: raw,
            columns,
        }
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns[field.index()]
    }

    /// Source header text a field resolved to.
    pub fn header(&self, field: Field) -> Option<&str> {
        self.column(field).map(|i| self.headers[i].as_str())
    }

    /// Raw cell of `field` in `record`; `None` when unresolved or the record is short.
    pub fn get<'r>(&self, record: &'r StringRecord, field: Field) -> Option<&'r str> {
        self.column(field).and_then(|i| record.get(i))
    }

    pub fn unresolved(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.column(*f).is_none())
            .collect()
    }
}
