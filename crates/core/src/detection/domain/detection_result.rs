use crate::shared::plate_region::PlateRegion;

/// Plates found in one frame during one detection round.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    pub regions: Vec<PlateRegion>,
}

impl DetectionResult {
    pub fn new(regions: Vec<PlateRegion>) -> Self {
        Self { regions }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn any_found(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
