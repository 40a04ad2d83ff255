//! Experiment registry
//!
//! A fixed, deterministic ordering of experiments. Order matters only for
//! reproducible logging; applicators are independent and commute.

use crate::experiment::{Experiment, MutationOp, Step};
use pagelab_dom::Selector;

/// Class carried by every CTA button
pub const CTA_CLASS: &str = "chargeperk-cta-button";
/// Class carried by every outbound program link
pub const PROGRAM_LINK_CLASS: &str = "program-link";
/// Attribute holding a rewritten link's original destination
pub const ORIGINAL_URL_ATTR: &str = "data-original-url";

/// Registry of experiments, applied in registration order
#[derive(Debug, Clone, Default)]
pub struct ExperimentRegistry {
    experiments: Vec<Experiment>,
}

impl ExperimentRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock ChargePerks experiments
    ///
    /// Fixed order: hero headline → hero media → CTA text → banner message
    /// → program link destinations → section layout → page version.
    #[must_use]
    pub fn chargeperks() -> Self {
        let mut registry = Self::new();

        registry.register(
            Experiment::new("chargeperk-hero-headline", "hero-headline").with_variant(
                "B",
                vec![Step::mutate(
                    Selector::class("chargeperks-hero-headline"),
                    MutationOp::SetText {
                        text: "Get $50 when you join ChargePerks".into(),
                    },
                )],
            ),
        );

        registry.register(
            Experiment::new("chargeperk-hero-media", "hero-media").with_variant(
                "B",
                vec![
                    Step::mutate(
                        Selector::class("chargeperks-hero-image"),
                        MutationOp::SetVisibility { visible: false },
                    ),
                    Step::mutate(
                        Selector::class("chargeperks-hero-video"),
                        MutationOp::SetVisibility { visible: true },
                    ),
                ],
            ),
        );

        registry.register(
            Experiment::new("chargeperk-cta-text", "cta-button")
                .with_variant(
                    "B",
                    vec![Step::mutate(
                        Selector::class(CTA_CLASS),
                        MutationOp::SetText {
                            text: "RESERVE SPOT".into(),
                        },
                    )],
                )
                .with_variant(
                    "C",
                    vec![Step::mutate(
                        Selector::class(CTA_CLASS),
                        MutationOp::SetText {
                            text: "GET STARTED".into(),
                        },
                    )],
                )
                .with_variant(
                    "D",
                    vec![Step::mutate(
                        Selector::class(CTA_CLASS),
                        MutationOp::SetText {
                            text: "START EARNING".into(),
                        },
                    )],
                ),
        );

        registry.register(
            Experiment::new("chargeperk-banner-message", "banner-message")
                .with_variant(
                    "B",
                    vec![Step::mutate(
                        Selector::class("chargeperks-banner-text"),
                        MutationOp::SetText {
                            text: "Harness the power of your EV to support California's \
                                   electric grid during periods of high demand"
                                .into(),
                        },
                    )],
                )
                .with_variant(
                    "C",
                    vec![Step::mutate(
                        Selector::class("chargeperks-banner-text"),
                        MutationOp::SetText {
                            text: "ChargePerks California is available to drivers in select \
                                   PG&E, SCE, LADWP, SDG&E and SMUD zip codes. Reserve your \
                                   spot today!"
                                .into(),
                        },
                    )],
                ),
        );

        registry.register(
            Experiment::new("program-destination", "program-link").with_variant(
                "B",
                vec![
                    program_link_step("PG&E", "https://charge.weavegrid.com/pge/"),
                    program_link_step("SCE", "https://charge.weavegrid.com/sce/"),
                    program_link_step("SMUD", "https://charge.weavegrid.com/smud/"),
                ],
            ),
        );

        registry.register(
            Experiment::new("section-layout", "section-layout").with_variant(
                "B",
                vec![Step::mutate(
                    Selector::class("chargeperks-sections-container"),
                    MutationOp::Reorder {
                        order: vec![1, 0, 3, 2],
                    },
                )],
            ),
        );

        registry.register(
            Experiment::new("chargeperk-page-version", "page-version").with_variant(
                "B",
                vec![Step::Redirect {
                    to: "/chargeperks-b".into(),
                    from: Some("/chargeperks".into()),
                }],
            ),
        );

        registry
    }

    /// Append an experiment; it runs after everything already registered
    pub fn register(&mut self, experiment: Experiment) {
        self.experiments.push(experiment);
    }

    /// Experiments in application order
    pub fn iter(&self) -> impl Iterator<Item = &Experiment> {
        self.experiments.iter()
    }

    /// Number of registered experiments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

fn program_link_step(link_id: &str, url: &str) -> Step {
    Step::mutate(
        Selector::id(link_id),
        MutationOp::SetAttribute {
            name: "href".into(),
            value: url.into(),
            record_original_in: Some(ORIGINAL_URL_ATTR.into()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_registry_order_is_fixed() {
        let registry = ExperimentRegistry::chargeperks();
        let keys: Vec<_> = registry.iter().map(|e| e.key().as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "chargeperk-hero-headline",
                "chargeperk-hero-media",
                "chargeperk-cta-text",
                "chargeperk-banner-message",
                "program-destination",
                "section-layout",
                "chargeperk-page-version",
            ]
        );
    }

    #[test]
    fn cta_experiment_declares_three_treatments() {
        let registry = ExperimentRegistry::chargeperks();
        let cta = registry
            .iter()
            .find(|e| e.key().as_str() == "chargeperk-cta-text")
            .unwrap();
        let letters: Vec<_> = cta.variants().collect();
        assert_eq!(letters, vec!["B", "C", "D"]);
    }
}
