//! Technique catalog - the closed set of prompting strategies
//!
//! Each technique maps to one immutable [`TechniqueConfig`] record through
//! [`TECHNIQUE_CATALOG`]. The instruction template is passed to the model as
//! its system instruction and is the only thing that differs between calls.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Analysis strategy identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Technique {
    /// Fast heuristic scan of the dominant dish
    RapidScan,
    /// Deliberate multi-step ingredient / cooking-method / density reasoning
    DeepAnalysis,
    /// Conservative, safety-biased clinical estimate
    HealthOptimized,
}

/// Immutable presentation and prompting data for one technique
#[derive(Debug, PartialEq, Eq)]
pub struct TechniqueConfig {
    pub technique: Technique,
    pub name: &'static str,
    pub description: &'static str,
    /// Display color (hex)
    pub color: &'static str,
    pub instruction: &'static str,
}

const RAPID_SCAN_INSTRUCTION: &str = "\
You are a fast food-scanning AI.
Identify the food in the image immediately and provide a standard nutritional estimate based on common serving sizes.
Do not overthink ingredients. Focus on the most likely standard dish.
Return raw estimates.";

const DEEP_ANALYSIS_INSTRUCTION: &str = "\
You are an advanced nutritional researcher.
Perform a deep breakdown of the image. Analyze:
1. Visible ingredients and their ratios.
2. Cooking methods (fried, grilled, steamed) and their impact on oil content.
3. Density and volume estimation relative to standard plate sizes.
Use a Chain-of-Thought process before outputting the final JSON.
Be precise and account for hidden fats or sugars.";

const HEALTH_OPTIMIZED_INSTRUCTION: &str = "\
You are a strict clinical dietitian.
Analyze this food for a patient with dietary restrictions.
Tend to overestimate calories and fats slightly to be safe (conservative estimate).
Focus on the nutritional quality.
Be critical about portion sizes.";

/// Catalog in display order. Indexed by `Technique as usize`.
pub static TECHNIQUE_CATALOG: [TechniqueConfig; 3] = [
    TechniqueConfig {
        technique: Technique::RapidScan,
        name: "Rapid Visual Scan",
        description: "Quick estimation based on visual heuristics and dominant features.",
        color: "#06b6d4",
        instruction: RAPID_SCAN_INSTRUCTION,
    },
    TechniqueConfig {
        technique: Technique::DeepAnalysis,
        name: "Chain-of-Thought Analytical",
        description: "Detailed breakdown of ingredients, density, and cooking methods.",
        color: "#8b5cf6",
        instruction: DEEP_ANALYSIS_INSTRUCTION,
    },
    TechniqueConfig {
        technique: Technique::HealthOptimized,
        name: "Clinical Dietitian Review",
        description: "Conservative estimation focused on nutritional density and hidden calories.",
        color: "#22c55e",
        instruction: HEALTH_OPTIMIZED_INSTRUCTION,
    },
];

impl Technique {
    pub const ALL: [Technique; 3] = [
        Technique::RapidScan,
        Technique::DeepAnalysis,
        Technique::HealthOptimized,
    ];

    pub fn config(self) -> &'static TechniqueConfig {
        &TECHNIQUE_CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.config().name
    }

    pub fn description(self) -> &'static str {
        self.config().description
    }

    pub fn instruction(self) -> &'static str {
        self.config().instruction
    }

    /// Wire identifier (e.g. `RAPID_SCAN`)
    pub fn id(self) -> &'static str {
        match self {
            Technique::RapidScan => "RAPID_SCAN",
            Technique::DeepAnalysis => "DEEP_ANALYSIS",
            Technique::HealthOptimized => "HEALTH_OPTIMIZED",
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_lookup_matches_identity() {
        for technique in Technique::ALL {
            assert_eq!(technique.config().technique, technique);
        }
    }

    #[test]
    fn test_instructions_are_distinct() {
        let instructions: HashSet<_> = Technique::ALL.iter().map(|t| t.instruction()).collect();
        assert_eq!(instructions.len(), Technique::ALL.len());
        assert!(Technique::RapidScan.instruction().contains("Do not overthink"));
        assert!(Technique::DeepAnalysis.instruction().contains("Chain-of-Thought"));
        assert!(Technique::HealthOptimized.instruction().contains("conservative estimate"));
    }

    #[test]
    fn test_serde_identifiers() {
        let json = serde_json::to_string(&Technique::HealthOptimized).unwrap();
        assert_eq!(json, "\"HEALTH_OPTIMIZED\"");
        let parsed: Technique = serde_json::from_str("\"DEEP_ANALYSIS\"").unwrap();
        assert_eq!(parsed, Technique::DeepAnalysis);
        assert_eq!(Technique::RapidScan.to_string(), "RAPID_SCAN");
    }
}
