//! Presentation adapters for cascade and flow results
//!
//! Chart components receive plain data from here and own all rendering.
//! The waterfall shows pass-through stages as bars; losses travel as
//! annotations on the bars instead of separate negative bars.

use crate::calculator::{Cascade, CascadeStage, FlowGraph, FlowLink, FlowNodeKind};
use crate::core_types::units::{Percent, Volume};
use serde::Serialize;

/// Pass-through stages only, in cascade order (5 bars).
pub fn waterfall_bars(cascade: &Cascade) -> Vec<&CascadeStage> {
    cascade.iter().filter(|s| !s.is_loss).collect()
}

/// Loss stages only, in cascade order (4 annotations).
pub fn loss_annotations(cascade: &Cascade) -> Vec<&CascadeStage> {
    cascade.iter().filter(|s| s.is_loss).collect()
}

/// Link with its weight floored for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderLink {
    /// Index of the source node
    pub source: usize,
    /// Index of the target node
    pub target: usize,
    /// Weight to draw, at least [`FlowLink::RENDER_FLOOR`]
    pub value: f64,
}

impl From<&FlowLink> for RenderLink {
    fn from(link: &FlowLink) -> Self {
        RenderLink {
            source: link.source,
            target: link.target,
            value: *link.render_value(),
        }
    }
}

/// Headline numbers shown next to the flow diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowSummary {
    /// Volume entering the graph
    pub theoretical: Volume,
    /// Volume reaching the biogas node
    pub final_volume: Volume,
    /// Volume ending in any loss node
    pub total_losses: Volume,
    /// `total_losses` as a share of `theoretical`
    pub loss_percentage: Percent,
}

impl FlowGraph {
    /// Links ready for a Sankey renderer
    pub fn render_links(&self) -> Vec<RenderLink> {
        self.links.iter().map(RenderLink::from).collect()
    }

    /// Theoretical, final and lost volumes, from exact link values
    pub fn summary(&self) -> FlowSummary {
        let unit = self
            .links
            .first()
            .map(|l| l.value.unit())
            .unwrap_or_default();
        let theoretical = Volume::new(self.outflow(FlowNodeKind::TheoreticalPotential), unit);
        let final_volume = Volume::new(self.inflow(FlowNodeKind::BiogasPotential), unit);
        let total_losses = Volume::new(
            FlowNodeKind::ALL
                .into_iter()
                .filter(|k| k.is_loss())
                .map(|k| self.inflow(k))
                .sum(),
            unit,
        );
        FlowSummary {
            theoretical,
            final_volume,
            total_losses,
            loss_percentage: total_losses.percent_of(theoretical),
        }
    }
}

/// Compact label for a volume: `1.23B`, `404.60k`, `950`.
///
/// Thresholds apply to the magnitude; negative (loss) values keep their sign.
pub fn format_compact(value: f64) -> String {
    let magnitude = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if magnitude >= 1e9 {
        format!("{sign}{:.2}B", magnitude / 1e9)
    } else if magnitude >= 1e6 {
        format!("{sign}{:.2}M", magnitude / 1e6)
    } else if magnitude >= 1e3 {
        format!("{sign}{:.2}k", magnitude / 1e3)
    } else {
        let whole = format!("{magnitude:.0}");
        if whole == "0" {
            whole
        } else {
            format!("{sign}{whole}")
        }
    }
}
