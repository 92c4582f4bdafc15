// crates/translatable-core/src/core/fallback.rs
// ============================================================================
// Module: Locale Fallback Resolver
// Description: Computes the next locale to probe when a translation is missing.
// Purpose: Resolve fallback directives against an explicit locale context.
// Dependencies: crate::core::identifiers
// ============================================================================

//! ## Overview
//! When a translation is missing for the requested locale, resolution may
//! probe exactly one further locale. The fallback directive selects that
//! target: a named locale, the context's default fallback locale, or nothing.
//! A computed target equal to the current locale degrades to no fallback,
//! which also neutralizes misconfigured self-fallback chains.
//!
//! Locale state is carried in an explicit [`LocaleContext`] threaded through
//! every call; there is no process-global locale.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::identifiers::Locale;

// ============================================================================
// SECTION: Directive
// ============================================================================

/// Missing-translation fallback directive.
///
/// # Invariants
/// - Variants are stable for configuration mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackDirective {
    /// Do not probe any further locale.
    Disabled,
    /// Probe the context's default fallback locale.
    DefaultLocale,
    /// Probe the named locale.
    Locale(Locale),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Ambient locale state for a resolution call.
///
/// # Invariants
/// - `default_directive` never needs the context it is resolved against to be
///   stable; [`FallbackDirective::DefaultLocale`] reads
///   `default_fallback_locale` at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleContext {
    /// Locale used when a call does not name one.
    pub current_locale: Locale,
    /// Locale probed by [`FallbackDirective::DefaultLocale`].
    pub default_fallback_locale: Locale,
    /// Directive applied by attribute reads that do not name one.
    pub default_directive: FallbackDirective,
}

impl LocaleContext {
    /// Creates a context falling back to `default_fallback_locale` by default.
    #[must_use]
    pub const fn new(current_locale: Locale, default_fallback_locale: Locale) -> Self {
        Self {
            current_locale,
            default_fallback_locale,
            default_directive: FallbackDirective::DefaultLocale,
        }
    }

    /// Replaces the default directive applied by attribute reads.
    #[must_use]
    pub fn with_directive(mut self, directive: FallbackDirective) -> Self {
        self.default_directive = directive;
        self
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Returns the single next locale to probe, or `None` when fallback is
/// disabled or the computed target equals `current`.
#[must_use]
pub fn fallback_target(
    current: &Locale,
    directive: &FallbackDirective,
    ctx: &LocaleContext,
) -> Option<Locale> {
    let target = match directive {
        FallbackDirective::Disabled => return None,
        FallbackDirective::DefaultLocale => &ctx.default_fallback_locale,
        FallbackDirective::Locale(locale) => locale,
    };
    if target == current {
        return None;
    }
    Some(target.clone())
}
