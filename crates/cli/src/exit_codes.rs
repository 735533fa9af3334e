//! CLI exit code registry.
//!
//! Every exit status `romaneio` can return is declared here. Scripts that
//! wrap the CLI branch on these values, so existing codes never change
//! meaning.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error (unspecified)                   |
//! | 2       | Universal  | CLI usage error (bad args, unsupported file)  |
//! | 3-4     | input      | Reading and decoding input files              |
//! | 60-69   | recon      | Configuration, dataset shape, strict checks   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown region, unsupported file type.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-4)
// =============================================================================

/// Input or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Input file was read but could not be decoded into a grid.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A dataset lacks every accepted header for a required column.
pub const EXIT_RECON_MISSING_COLUMN: u8 = 61;

/// `compare --strict` found order numbers present on only one side.
pub const EXIT_RECON_UNMATCHED: u8 = 62;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_PARSE,
            EXIT_RECON_INVALID_CONFIG,
            EXIT_RECON_MISSING_COLUMN,
            EXIT_RECON_UNMATCHED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn recon_codes_stay_in_their_range() {
        for code in [EXIT_RECON_INVALID_CONFIG, EXIT_RECON_MISSING_COLUMN, EXIT_RECON_UNMATCHED] {
            assert!((60..=69).contains(&code));
        }
    }
}
