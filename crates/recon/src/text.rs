//! Text folding shared by header lookup and the classifiers.

/// Lower-case, trim, collapse inner whitespace and strip Portuguese diacritics.
///
/// `"  Referência "` and `"referencia"` fold to the same key.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars().flat_map(char::to_lowercase) {
            out.push(strip_accent(c));
        }
    }
    out
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Parse the leading integer of a string, the way spreadsheet exports write
/// counts ("12", "12 pedidos", "  7"). Returns `None` when no digits lead.
pub fn leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_case_accents_and_spacing() {
        assert_eq!(fold("  Referência "), "referencia");
        assert_eq!(fold("Situação  -  Finalizado"), "situacao - finalizado");
        assert_eq!(fold("ROMANEIO EM TRANSFERÊNCIA"), "romaneio em transferencia");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn leading_int_variants() {
        assert_eq!(leading_int("12"), Some(12));
        assert_eq!(leading_int(" 12 pedidos"), Some(12));
        assert_eq!(leading_int("3.9"), Some(3));
        assert_eq!(leading_int("-4"), Some(-4));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
    }
}
