//! Field mapping: one batch of guests → the arrays the template indexes.

use crate::config::ColorMap;
use crate::error::PlaceCardError;
use crate::pipeline::guests::GuestRecord;
use serde::Serialize;

/// Per-sheet template context: `names.i`, `tables.i`, `colors.i` describe the
/// card at position `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub names: Vec<String>,
    pub tables: Vec<String>,
    pub colors: Vec<String>,
}

/// Project a batch onto index-aligned field arrays, resolving each food
/// choice to its card color.
pub fn map_sheet(batch: &[GuestRecord], colors: &ColorMap) -> Result<Sheet, PlaceCardError> {
    let mut sheet = Sheet {
        names: Vec::with_capacity(batch.len()),
        tables: Vec::with_capacity(batch.len()),
        colors: Vec::with_capacity(batch.len()),
    };

    for guest in batch {
        let color = colors
            .get(&guest.food)
            .ok_or_else(|| PlaceCardError::UnknownFoodChoice {
                food: guest.food.clone(),
                guest: guest.name.clone(),
                known: colors.known_choices(),
            })?;
        sheet.names.push(guest.name.clone());
        sheet.tables.push(guest.table.clone());
        sheet.colors.push(color.to_string());
    }

    Ok(sheet)
}

/// Map every batch up front so an unknown food choice aborts the run before
/// anything is written.
pub fn map_sheets(
    batches: &[Vec<GuestRecord>],
    colors: &ColorMap,
) -> Result<Vec<Sheet>, PlaceCardError> {
    batches.iter().map(|b| map_sheet(b, colors)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(name: &str, table: &str, food: &str) -> GuestRecord {
        GuestRecord {
            name: name.into(),
            table: table.into(),
            food: food.into(),
        }
    }

    #[test]
    fn arrays_are_index_aligned() {
        let batch = vec![
            guest("Ada", "1", "salmon"),
            guest("Alan", "2", "pork"),
            guest("Grace", "1", "kids"),
        ];
        let sheet = map_sheet(&batch, &ColorMap::default()).unwrap();
        assert_eq!(sheet.names, vec!["Ada", "Alan", "Grace"]);
        assert_eq!(sheet.tables, vec!["1", "2", "1"]);
        assert_eq!(sheet.colors, vec!["#ffaaaa", "#5f8dd3", "#ddafe9"]);
    }

    #[test]
    fn food_lookup_ignores_case() {
        let batch = vec![guest("Ada", "1", "Salmon"), guest("Alan", "1", "salmon")];
        let sheet = map_sheet(&batch, &ColorMap::default()).unwrap();
        assert_eq!(sheet.colors, vec!["#ffaaaa", "#ffaaaa"]);
    }

    #[test]
    fn unknown_food_is_fatal() {
        let batch = vec![guest("Ada", "1", "salmon"), guest("Tim", "4", "tofu")];
        let err = map_sheet(&batch, &ColorMap::default()).unwrap_err();
        match err {
            PlaceCardError::UnknownFoodChoice { food, guest, .. } => {
                assert_eq!(food, "tofu");
                assert_eq!(guest, "Tim");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicates_are_kept() {
        let ada = guest("Ada", "1", "veggie");
        let sheet = map_sheet(&[ada.clone(), ada.clone(), ada], &ColorMap::default()).unwrap();
        assert_eq!(sheet.names, vec!["Ada"; 3]);
    }

    #[test]
    fn map_sheets_stops_at_first_unknown() {
        let batches = vec![vec![guest("Ada", "1", "pork")], vec![guest("Tim", "2", "tofu")]];
        assert!(map_sheets(&batches, &ColorMap::default()).is_err());
    }
}
