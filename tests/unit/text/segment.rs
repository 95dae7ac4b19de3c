use super::*;

fn texts(segs: &[Segment]) -> Vec<&str> {
    segs.iter().map(|s| s.text.as_str()).collect()
}

#[test]
fn two_short_sentences_fit_one_segment() {
    let segs = segment("Hola. Mundo.", 300).unwrap();
    assert_eq!(texts(&segs), vec!["Hola. Mundo."]);
    assert_eq!(segs[0].index, 0);
}

#[test]
fn empty_and_punctuation_only_text_is_input_error() {
    for text in ["", "   \n\t", "...", " . ! ? "] {
        let err = segment(text, 300).unwrap_err();
        assert!(matches!(err, NarrationError::Input(ref m) if m == "empty text"), "{text:?}");
    }
}

#[test]
fn missing_terminal_period_is_appended() {
    assert_eq!(split_sentences("Hola. Mundo"), vec!["Hola.", "Mundo."]);
}

#[test]
fn question_and_exclamation_keep_their_terminators() {
    assert_eq!(
        split_sentences("¿Qué tal? ¡Muy bien! Vale..."),
        vec!["¿Qué tal?", "¡Muy bien!", "Vale..."]
    );
}

#[test]
fn whitespace_runs_collapse() {
    assert_eq!(
        split_sentences("  Una   frase\n\ncon saltos.  Otra.\n"),
        vec!["Una frase con saltos.", "Otra."]
    );
}

#[test]
fn greedy_grouping_closes_segment_at_limit() {
    // "aaaa." is 5 chars; with a limit of 12: 5 + 5 < 12 joins (11 chars), 11 + 5 is not < 12.
    let segs = segment("aaaa. bbbb. cccc.", 12).unwrap();
    assert_eq!(texts(&segs), vec!["aaaa. bbbb.", "cccc."]);
    assert_eq!(segs[1].index, 1);
}

#[test]
fn oversized_sentence_stands_alone() {
    let long = format!("{}.", "x".repeat(50));
    let text = format!("Corta. {long} Fin.");
    let segs = segment(&text, 20).unwrap();
    assert_eq!(texts(&segs), vec!["Corta.", long.as_str(), "Fin."]);
}

#[test]
fn segments_never_exceed_limit_unless_single_sentence() {
    let text = "Primera frase del texto. Segunda frase algo más larga que la primera. \
                Tercera. Cuarta frase con bastantes palabras para llenar. Quinta y última frase.";
    for max in [10usize, 25, 40, 80, 300] {
        let segs = segment(text, max).unwrap();
        for s in &segs {
            let single = split_sentences(&s.text).len() == 1;
            assert!(s.char_len() <= max || single, "max={max} seg={:?}", s.text);
        }
    }
}

#[test]
fn joined_segments_reconstruct_normalized_input() {
    let text = "Érase una vez...   un reino lejano! ¿Quién vivía allí? Nadie lo sabe. \
                Pero la historia continúa sin punto final";
    for max in [1usize, 15, 30, 60, 300] {
        let segs = segment(text, max).unwrap();
        let joined = segs
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, normalize(text), "max={max}");
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.index, i);
            assert!(!s.text.is_empty());
        }
    }
}

#[test]
fn lengths_count_characters_not_bytes() {
    // 8 chars, 15 bytes each.
    let a = "ñññññññ.";
    let text = format!("{a} {a}");
    let segs = segment(&text, 18).unwrap();
    assert_eq!(segs.len(), 1);
}
