//! Selection error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::attributes::{AttributeValue, Mismatch};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::Name;

/// A candidate variant eliminated by attribute matching, with the specific
/// attributes that rejected it. Enough detail to render a diagnostic
/// without re-walking the configuration graph.
#[derive(Debug, Clone)]
pub struct RejectedCandidate {
    pub name: Name,
    pub declared_on: Name,
    pub attributes: Vec<(Name, AttributeValue)>,
    pub mismatches: Vec<Mismatch>,
}

/// A candidate variant that survived matching and every disambiguation
/// step, tied with at least one other.
#[derive(Debug, Clone)]
pub struct TiedCandidate {
    pub name: Name,
    pub declared_on: Name,
    pub inherited: bool,
    pub attributes: Vec<(Name, AttributeValue)>,
}

/// Error during variant selection.
///
/// Selection is a pure function of the producer state and the request; the
/// only recovery is the caller adjusting the requested attributes.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum SelectionError {
    #[error("no variant of `{configuration}` matches the requested attributes")]
    #[diagnostic(
        code(slipway::select::no_match),
        help("Remove or relax one of the requested attributes")
    )]
    NoMatchingVariant {
        configuration: Name,
        requested: Vec<(Name, AttributeValue)>,
        candidates: Vec<RejectedCandidate>,
    },

    #[error("multiple variants of `{configuration}` match the requested attributes equally well")]
    #[diagnostic(
        code(slipway::select::ambiguous),
        help("Request an additional attribute that distinguishes the tied variants")
    )]
    AmbiguousVariant {
        configuration: Name,
        requested: Vec<(Name, AttributeValue)>,
        candidates: Vec<TiedCandidate>,
    },
}

fn render_attributes(attributes: &[(Name, AttributeValue)]) -> String {
    let rendered: Vec<String> = attributes
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

impl SelectionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SelectionError::NoMatchingVariant {
                configuration,
                requested,
                candidates,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "no variant of `{}` matches {}",
                    configuration,
                    render_attributes(requested)
                ));

                if candidates.is_empty() {
                    diag = diag
                        .with_context("the configuration declares no variants")
                        .with_suggestion(suggestions::NO_VARIANTS);
                    return diag;
                }

                for candidate in candidates {
                    let rejected_on: Vec<String> = candidate
                        .mismatches
                        .iter()
                        .map(|m| {
                            format!(
                                "`{}` (requested `{}`, found `{}`)",
                                m.attribute, m.requested, m.found
                            )
                        })
                        .collect();
                    diag = diag.with_context(format!(
                        "candidate `{}` {} rejected on {}",
                        candidate.name,
                        render_attributes(&candidate.attributes),
                        rejected_on.join(", ")
                    ));
                }

                diag.with_suggestion(suggestions::RELAX_REQUEST)
            }

            SelectionError::AmbiguousVariant {
                configuration,
                requested,
                candidates,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "request {} matches multiple variants of `{}` equally well",
                    render_attributes(requested),
                    configuration
                ));

                for candidate in candidates {
                    let origin = if candidate.inherited {
                        format!(" (inherited from `{}`)", candidate.declared_on)
                    } else {
                        String::new()
                    };
                    diag = diag.with_context(format!(
                        "candidate `{}` {}{}",
                        candidate.name,
                        render_attributes(&candidate.attributes),
                        origin
                    ));
                }

                diag.with_suggestion(suggestions::NARROW_REQUEST)
            }
        }
    }
}
