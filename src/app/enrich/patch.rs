//! Corrections applied to the dataset served on `/`
//!
//! Upstream tags a few fuels with the wrong fuel-type category. The raw cached
//! sections keep the upstream values; only the full-document response is
//! corrected.

use serde_json::Value;

use crate::app::dataset::{Dataset, Record, RecordId};
use crate::constants::{fuel_patch, sections};

const CATEGORY_FIELD: &str = "vrsta_goriva_id";

/// Force the known mis-tagged fuels onto their real categories
///
/// Returns how many records were changed.
pub fn patch_fuel_categories(fuels: &mut [Record]) -> usize {
    fuels.iter_mut().map(patch_fuel).filter(|changed| *changed).count()
}

fn patch_fuel(fuel: &mut Record) -> bool {
    let Some(id) = fuel.id() else {
        return false;
    };

    let category = if fuel.text("naziv") == Some(fuel_patch::EURODIESEL_NAME)
        && fuel_patch::EURODIESEL_IDS.contains(&id.value())
    {
        fuel_patch::EURODIESEL_CATEGORY
    } else if id == RecordId::new(fuel_patch::FUEL_30_ID) {
        fuel_patch::FUEL_30_CATEGORY
    } else {
        return false;
    };

    fuel.insert(CATEGORY_FIELD, category);
    true
}

/// The document served on `/`
///
/// An owned copy of `dataset` without the hidden reference tables and with the
/// fuel category corrections applied.
pub fn public_dataset(dataset: &Dataset) -> Dataset {
    let mut public = dataset.clone();
    for name in sections::HIDDEN {
        public.remove(name);
    }

    if let Some(Value::Array(values)) = public.get_mut(sections::FUELS) {
        let (positions, mut fuels): (Vec<usize>, Vec<Record>) = values
            .iter()
            .enumerate()
            .filter_map(|(i, value)| Record::from_value(value.clone()).map(|fuel| (i, fuel)))
            .unzip();
        patch_fuel_categories(&mut fuels);
        for (i, fuel) in positions.into_iter().zip(fuels) {
            values[i] = fuel.into_value();
        }
    }

    public
}
