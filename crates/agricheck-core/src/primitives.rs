//! # Fixed Primitives
//!
//! Compile-time constants shared by the core and the binary.
//!
//! The defaults point at the public LINDAS endpoint and the agricultural
//! inspection namespace; the binary may override them through configuration.

/// Public SPARQL endpoint serving the inspection taxonomy.
pub const DEFAULT_ENDPOINT: &str = "https://lindas.admin.ch/query";

/// Namespace every inspection identifier lives under.
///
/// Checklist links carry only the trailing slug; ids are rebuilt by
/// prefixing this base.
pub const DEFAULT_BASE_IRI: &str = "https://agriculture.ld.admin.ch/inspection/";

/// Language tag used to filter labels and comments.
pub const DEFAULT_LANGUAGE: &str = "de";

/// Query parameter carrying the selected groups.
pub const GROUPS_PARAM: &str = "groups";

/// `InvalidGroups` reason for an absent or empty selection.
pub const NO_GROUPS: &str = "no groups given";

/// Deepest heading level a checklist section is rendered with.
pub const MAX_HEADING_LEVEL: usize = 6;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of groups accepted in one checklist request.
pub const MAX_GROUPS: usize = 512;

/// Maximum number of ids in one compression request.
pub const MAX_SELECTION: usize = 10_000;

/// Maximum length of a search query in bytes.
pub const MAX_SEARCH_LENGTH: usize = 256;

/// Maximum length of a language tag (BCP 47 allows up to 35).
pub const MAX_LANGUAGE_LENGTH: usize = 35;
