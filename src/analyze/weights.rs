//! Category weights of the score aggregator.
//!
//! Defaults (sum to 1.00):
//! html_context .15, structural_position .15, technical .10, visual .15,
//! multi_page .15, url_semantics .05, metadata .05, social_media .10, schema_markup .10
//!
//! The `[weights]` table of `config/crawler.toml` can override them; an override
//! that does not sum to 1.0 is rejected by `validate`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::candidate::SignalCategory;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub html_context: f32,
    pub structural_position: f32,
    pub technical: f32,
    pub visual: f32,
    pub multi_page: f32,
    pub url_semantics: f32,
    pub metadata: f32,
    pub social_media: f32,
    pub schema_markup: f32,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            html_context: 0.15,
            structural_position: 0.15,
            technical: 0.10,
            visual: 0.15,
            multi_page: 0.15,
            url_semantics: 0.05,
            metadata: 0.05,
            social_media: 0.10,
            schema_markup: 0.10,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: SignalCategory) -> f32 {
        match category {
            SignalCategory::HtmlContext => self.html_context,
            SignalCategory::StructuralPosition => self.structural_position,
            SignalCategory::Technical => self.technical,
            SignalCategory::Visual => self.visual,
            SignalCategory::MultiPageConsistency => self.multi_page,
            SignalCategory::UrlSemantics => self.url_semantics,
            SignalCategory::Metadata => self.metadata,
            SignalCategory::SocialMedia => self.social_media,
            SignalCategory::SchemaMarkup => self.schema_markup,
        }
    }

    pub fn total(&self) -> f32 {
        SignalCategory::ALL.iter().map(|c| self.weight(*c)).sum()
    }

    /// Every weight non-negative and finite, and the total within 1e-3 of 1.0.
    pub fn validate(&self) -> Result<()> {
        for c in SignalCategory::ALL {
            let w = self.weight(c);
            if !w.is_finite() || w < 0.0 {
                bail!("weight for {c} must be a non-negative number, got {w}");
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > 1e-3 {
            bail!("category weights must sum to 1.0, got {total:.3}");
        }
        Ok(())
    }
}
