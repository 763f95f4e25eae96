// Price band definitions per product line, exported as a flat CSV.
use crate::error::Result;
use serde::{Serialize, Serializer};
use std::io::Write;

/// Upper bounds of the bands shared by Sports Med and Trauma (band 1 starts at 5,000).
const SPORTS_TRAUMA_UPPER: [u64; 34] = [
    14_999, 29_999, 49_999, 74_999, 100_000, 150_000, 200_000, 250_000, 300_000, 350_000,
    400_000, 450_000, 500_000, 550_000, 600_000, 650_000, 700_000, 750_000, 800_000, 850_000,
    900_000, 950_000, 1_000_000, 1_200_000, 1_400_000, 1_600_000, 1_800_000, 2_000_000,
    2_300_000, 2_600_000, 2_900_000, 3_200_000, 3_500_000, 4_000_000,
];

/// Upper bounds shared by Primary Knees and Hips (band 1 starts at 2,000).
const JOINTS_UPPER: [u64; 29] = [
    50_000, 100_000, 150_000, 200_000, 250_000, 300_000, 350_000, 400_000, 450_000, 500_000,
    550_000, 600_000, 650_000, 700_000, 800_000, 900_000, 1_000_000, 1_250_000, 1_500_000,
    1_750_000, 2_000_000, 2_250_000, 2_500_000, 2_750_000, 3_000_000, 3_250_000, 3_500_000,
    3_750_000, 4_000_000,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandDefinition {
    #[serde(rename = "Band number")]
    pub band: String,
    #[serde(rename = "min value")]
    pub min: u64,
    #[serde(rename = "max value", serialize_with = "open_bound")]
    pub max: Option<u64>,
    #[serde(rename = "type")]
    pub product_line: &'static str,
}

fn open_bound<S: Serializer>(max: &Option<u64>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match max {
        Some(v) => s.serialize_u64(*v),
        None => s.serialize_str("inf"),
    }
}

/// Bands from a first lower bound and the list of closed upper bounds.
///
/// Each next band starts one above the previous upper bound (`step` for the
/// joint lines, which move in thousands); a final open band follows.
fn build(product_line: &'static str, first_min: u64, uppers: &[u64], step: u64) -> Vec<BandDefinition> {
    let mut out = Vec::with_capacity(uppers.len() + 1);
    let mut min = first_min;
    for (i, &upper) in uppers.iter().enumerate() {
        out.push(BandDefinition {
            band: format!("Band {}", i + 1),
            min,
            max: Some(upper),
            product_line,
        });
        min = upper + step;
    }
    out.push(BandDefinition {
        band: format!("Band {}", uppers.len() + 1),
        min,
        max: None,
        product_line,
    });
    out
}

pub fn all_bands() -> Vec<BandDefinition> {
    // Sports Med shares the Trauma bounds up to 1,400,000, then opens.
    let mut out = build("Sports Med", 5_000, &SPORTS_TRAUMA_UPPER[..25], 1);
    out.extend(build("Trauma", 5_000, &SPORTS_TRAUMA_UPPER, 1));
    out.extend(build("Primary Knees", 2_000, &JOINTS_UPPER, 1_000));
    out.extend(build("Hips", 2_000, &JOINTS_UPPER, 1_000));
    out
}

pub fn write_bands<W: Write>(writer: W, bands: &[BandDefinition]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for b in bands {
        wtr.serialize(b)?;
    }
    wtr.flush()?;
    Ok(())
}
