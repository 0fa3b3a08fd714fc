use serde::Serialize;

use crate::error::ScanError;

pub const CLASS_COUNT: usize = 3;

/// Output classes of the nail model, in the order of its score vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NailCondition {
    Healthy,
    Koilonychia,
    Onychomycosis,
}

impl NailCondition {
    pub const ALL: [NailCondition; CLASS_COUNT] = [
        NailCondition::Healthy,
        NailCondition::Koilonychia,
        NailCondition::Onychomycosis,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Koilonychia => "Koilonychia",
            Self::Onychomycosis => "Onychomycosis",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Healthy => {
                "Your nail looks healthy and shows no sign of a non-communicable disease. \
                 Keep your nails clean!"
            }
            Self::Koilonychia => {
                "Your nail was detected as koilonychia! This can be a sign of anemia. \
                 Please consult a doctor for a further examination."
            }
            Self::Onychomycosis => {
                "Your nail was detected as onychomycosis! This may be related to diabetes \
                 or a fungal infection. Please contact a doctor for treatment."
            }
        }
    }

    /// One-line explanation shown in the information panel.
    pub fn summary(self) -> &'static str {
        match self {
            Self::Healthy => "The nail looks normal, without changes in shape or color.",
            Self::Koilonychia => "The nail is concave like a spoon, often associated with anemia.",
            Self::Onychomycosis => {
                "The nail is thickened, discolored or brittle, possibly a sign of diabetes \
                 or a fungal infection."
            }
        }
    }
}

impl std::fmt::Display for NailCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub class_index: usize,
    pub condition: NailCondition,
    pub label: &'static str,
    pub description: &'static str,
    /// Highest class probability, in percent.
    pub confidence: f32,
}

impl PredictionResult {
    /// Confidence rounded to a whole percent, for progress bars.
    pub fn progress_percent(&self) -> u8 {
        self.confidence.round().clamp(0., 100.) as u8
    }
}

impl std::fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence)
    }
}

/// Turns the model's score vector into the displayed result.
///
/// The first maximum wins when several classes share the top score.
pub fn present(probabilities: &[f32]) -> Result<PredictionResult, ScanError> {
    if probabilities.len() != CLASS_COUNT {
        return Err(ScanError::OutputShape(probabilities.len()));
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(ScanError::NonFiniteOutput);
    }

    let (class_index, max) = probabilities
        .iter()
        .copied()
        .enumerate()
        .reduce(|accum, item| if item.1 > accum.1 { item } else { accum })
        .ok_or(ScanError::OutputShape(0))?;

    let condition =
        NailCondition::from_index(class_index).ok_or(ScanError::OutputShape(class_index))?;

    Ok(PredictionResult {
        class_index,
        condition,
        label: condition.label(),
        description: condition.description(),
        confidence: (max * 100.).clamp(0., 100.),
    })
}
