// [libs/core/targeting/src/version.rs]
/*!
 * APARATO: COMPARACIÓN SEMVER-LIKE (C3)
 * RESPONSABILIDAD: ORDENAR CADENAS DE VERSIÓN LIBRES SIN DEPENDER DE
 *    UN PARSER SEMVER ESTRICTO (EL CAMPO ES "FREE-FORM SEMVER-LIKE").
 *
 * Algoritmo (§4.1): separar por `.`, comparar segmentos numéricos de
 * izquierda a derecha rellenando con 0 los que falten; los segmentos
 * no numéricos se comparan lexicográficamente tras el prefijo numérico.
 */

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Numeric(u64),
    Lexical(&'a str),
}

fn parse_segment(raw: &str) -> Segment<'_> {
    match raw.parse::<u64>() {
        Ok(value) => Segment::Numeric(value),
        Err(_) => Segment::Lexical(raw),
    }
}

fn compare_segment(left: Segment<'_>, right: Segment<'_>) -> Ordering {
    match (left, right) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(&b),
        (Segment::Numeric(_), Segment::Lexical(_)) => Ordering::Less,
        (Segment::Lexical(_), Segment::Numeric(_)) => Ordering::Greater,
        (Segment::Lexical(a), Segment::Lexical(b)) => a.cmp(b),
    }
}

/// Compara dos cadenas de versión. Retorna `<0`, `0`, o `>0` como un
/// comparador de estilo C para encajar con la redacción del spec
/// (`cmp(device, min) < 0`).
pub fn compare_versions(left: &str, right: &str) -> i32 {
    let left_segments: Vec<&str> = left.split('.').collect();
    let right_segments: Vec<&str> = right.split('.').collect();
    let max_len = left_segments.len().max(right_segments.len());

    for index in 0..max_len {
        let left_raw = left_segments.get(index).copied().unwrap_or("0");
        let right_raw = right_segments.get(index).copied().unwrap_or("0");
        let ordering = compare_segment(parse_segment(left_raw), parse_segment(right_raw));
        match ordering {
            Ordering::Less => return -1,
            Ordering::Greater => return 1,
            Ordering::Equal => continue,
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_versions_compare_zero() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), 0);
    }

    #[test]
    fn shorter_version_pads_with_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), 0);
        assert_eq!(compare_versions("1.2.1", "1.2"), 1);
    }

    #[test]
    fn numeric_segments_compare_numerically_not_lexically() {
        assert_eq!(compare_versions("1.9.0", "1.10.0"), -1);
    }

    #[test]
    fn non_numeric_segments_fall_back_to_lexical() {
        assert_eq!(compare_versions("1.0.0-beta", "1.0.0-alpha"), 1);
    }

    #[test]
    fn numeric_always_sorts_before_lexical_at_same_position() {
        assert_eq!(compare_versions("1.0.0", "1.0.0-rc1"), -1);
    }
}
