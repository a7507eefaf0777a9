//! Land-cover fraction columns such as `lulc_2015_40`, parsed once into structured keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies one land-cover fraction column: `{category}_{year}_{class_code}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LandCoverKey {
    pub category: String,
    pub year: i32,
    pub class_code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a '<category>_<year>_<class>' column name")]
pub struct ParseLandCoverKeyError(pub String);

impl FromStr for LandCoverKey {
    type Err = ParseLandCoverKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLandCoverKeyError(s.to_string());
        let mut parts = s.rsplitn(3, '_');
        let class_code = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let year = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let category = parts.next().filter(|p| !p.is_empty()).ok_or_else(err)?;
        Ok(LandCoverKey {
            category: category.to_string(),
            year,
            class_code,
        })
    }
}

impl fmt::Display for LandCoverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.category, self.year, self.class_code)
    }
}

/// Dominant class per year for one catchment.
///
/// `fractions` holds every land-cover column of the catchment in column order.
/// A year whose columns contain any missing fraction is not computable. Ties go
/// to the first class in column order.
pub fn dominant_class_per_year(
    fractions: &[(LandCoverKey, Option<f64>)],
) -> BTreeMap<i32, Option<u32>> {
    let mut by_year: BTreeMap<i32, Vec<(u32, Option<f64>)>> = BTreeMap::new();
    for (key, fraction) in fractions {
        by_year
            .entry(key.year)
            .or_default()
            .push((key.class_code, *fraction));
    }

    by_year
        .into_iter()
        .map(|(year, classes)| {
            let mut best: Option<(u32, f64)> = None;
            for (class_code, fraction) in &classes {
                let Some(fraction) = fraction else {
                    return (year, None);
                };
                match best {
                    Some((_, best_fraction)) if *fraction <= best_fraction => {}
                    _ => best = Some((*class_code, *fraction)),
                }
            }
            (year, best.map(|(class_code, _)| class_code))
        })
        .collect()
}
