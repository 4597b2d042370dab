//! LaTeX escaping for caller-supplied field text.
//!
//! Every character that could open a group, start a command, or otherwise
//! alter document structure maps to a command-safe sequence. The
//! layout-preserving mode additionally encodes whitespace and dashes so the
//! spacing and line breaks the caller typed survive typesetting.

const HFILL: &str = "\\hfill";
const HFILL_ESCAPED: &str = "\\textbackslash{}hfill";

/// Escape structural LaTeX characters only.
pub fn escape(input: &str) -> String {
    escape_with(input, false)
}

/// Escape structural characters and encode layout whitespace.
pub fn escape_preserving_layout(input: &str) -> String {
    escape_with(input, true)
}

/// Escape a medicine name.
///
/// Names may deliberately embed `\hfill` to push the rest of the line to the
/// right edge of the block; the first escaped occurrence is restored to the
/// literal directive. Only that exact token sequence is restored.
pub fn escape_medicine_name(input: &str) -> String {
    escape(input).replacen(HFILL_ESCAPED, HFILL, 1)
}

fn escape_with(input: &str, preserve_layout: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\\' => out.push_str("\\textbackslash{}"),
            '#' => out.push_str("\\#"),
            '$' => out.push_str("\\$"),
            '%' => out.push_str("\\%"),
            '&' => out.push_str("\\&"),
            '^' => out.push_str("\\textasciicircum{}"),
            '_' => out.push_str("\\_"),
            '~' => out.push_str("\\textasciitilde{}"),
            ' ' if preserve_layout => out.push_str("\\ "),
            '\t' if preserve_layout => out.push_str("\\qquad{}"),
            '\r' if preserve_layout => {
                // CRLF collapses into a single line break.
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\newline{}");
            }
            '\n' if preserve_layout => out.push_str("\\newline{}"),
            '\u{2013}' if preserve_layout => out.push_str("\\--"),
            '\u{2014}' if preserve_layout => out.push_str("\\---"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_round_trips_unchanged() {
        assert_eq!(escape("Amoxicillin 500mg"), "Amoxicillin 500mg");
        assert_eq!(
            escape_preserving_layout("Amoxicillin"),
            "Amoxicillin"
        );
    }

    #[test]
    fn structural_characters_are_escaped() {
        assert_eq!(escape("{"), "\\{");
        assert_eq!(escape("}"), "\\}");
        assert_eq!(escape("\\"), "\\textbackslash{}");
        assert_eq!(escape("#"), "\\#");
        assert_eq!(escape("$"), "\\$");
        assert_eq!(escape("%"), "\\%");
        assert_eq!(escape("&"), "\\&");
        assert_eq!(escape("^"), "\\textasciicircum{}");
        assert_eq!(escape("_"), "\\_");
        assert_eq!(escape("~"), "\\textasciitilde{}");
    }

    #[test]
    fn mixed_input_escapes_every_delimiter() {
        assert_eq!(
            escape_preserving_layout("a{b}c\\d $100"),
            "a\\{b\\}c\\textbackslash{}d\\ \\$100"
        );
        assert_eq!(
            escape("50% & $3 ~ #1"),
            "50\\% \\& \\$3 \\textasciitilde{} \\#1"
        );
    }

    #[test]
    fn layout_mode_encodes_whitespace() {
        assert_eq!(escape_preserving_layout("a b"), "a\\ b");
        assert_eq!(escape_preserving_layout("a\tb"), "a\\qquad{}b");
        assert_eq!(escape_preserving_layout("a\nb"), "a\\newline{}b");
        assert_eq!(escape_preserving_layout("a\r\nb"), "a\\newline{}b");
        assert_eq!(escape_preserving_layout("a\u{2013}b"), "a\\--b");
        assert_eq!(escape_preserving_layout("a\u{2014}b"), "a\\---b");
    }

    #[test]
    fn structural_mode_leaves_whitespace_alone() {
        assert_eq!(escape("a b\nc"), "a b\nc");
    }

    #[test]
    fn medicine_name_restores_hfill() {
        assert_eq!(
            escape_medicine_name("Aspirin\\hfill 100mg"),
            "Aspirin\\hfill 100mg"
        );
    }

    #[test]
    fn medicine_name_restores_only_the_first_occurrence() {
        assert_eq!(
            escape_medicine_name("a\\hfill b\\hfill c"),
            "a\\hfill b\\textbackslash{}hfill c"
        );
    }

    #[test]
    fn similar_but_unescaped_input_is_not_restored() {
        // No backslash in the input, so no escaped sequence is produced and
        // nothing may be rewritten back into a live directive.
        assert_eq!(
            escape_medicine_name("textbackslash{}hfill"),
            "textbackslash\\{\\}hfill"
        );
        // A truncated directive stays escaped.
        assert_eq!(
            escape_medicine_name("\\hfil"),
            "\\textbackslash{}hfil"
        );
    }

    #[test]
    fn medicine_name_still_escapes_everything_else() {
        assert_eq!(
            escape_medicine_name("5% dextrose & saline"),
            "5\\% dextrose \\& saline"
        );
    }
}
