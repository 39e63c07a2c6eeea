//! Stemmer - Porter-style suffix stripping
//!
//! Reduces a single lowercase word to its root so that "orders", "ordered"
//! and "ordering" all score against the catalog token "order".
//!
//! The rule tables run in a fixed order and each step stops at the first
//! rule that both matches and passes its measure gate. Changing the order of
//! any table changes stemming results for common derivational forms.

/// Words shorter than this are returned unchanged.
pub const MIN_STEM_LEN: usize = 3;

/// Derivational suffixes (Porter step 2), gated on `measure(stem) > 0`.
const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

/// Porter step 3, same gating as step 2.
const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

/// Porter step 4, removed outright when `measure(stem) > 1`.
const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Stem a single word.
///
/// Input is expected to be one lowercase token as produced by the tokenizer.
/// Words shorter than [`MIN_STEM_LEN`] and words containing non-ASCII
/// characters are returned unchanged.
///
/// ```
/// use intent_flow::stemmer::stem;
///
/// assert_eq!(stem("ordering"), "order");
/// assert_eq!(stem("relational"), "relat");
/// assert_eq!(stem("go"), "go");
/// ```
pub fn stem(word: &str) -> String {
    let mut word = word.to_lowercase();
    if word.len() < MIN_STEM_LEN || !word.is_ascii() {
        return word;
    }

    step1a(&mut word);
    step1b(&mut word);
    step1c(&mut word);
    replace_first(&mut word, STEP2_RULES);
    replace_first(&mut word, STEP3_RULES);
    step4(&mut word);
    step5(&mut word);

    word
}

/// `a`, `e`, `i`, `o`, `u`, or a `y` that follows a consonant.
pub fn is_vowel(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => true,
        b'y' => i > 0 && !is_vowel(word, i - 1),
        _ => false,
    }
}

/// Porter measure: the number of vowel-run to consonant-run switches.
///
/// `tree` → 0, `trouble` → 1, `oaten` → 2.
pub fn measure(word: &[u8]) -> usize {
    let mut m = 0;
    let mut prev_was_vowel = false;

    for i in 0..word.len() {
        let vowel = is_vowel(word, i);
        if prev_was_vowel && !vowel {
            m += 1;
        }
        prev_was_vowel = vowel;
    }

    m
}

pub fn contains_vowel(word: &[u8]) -> bool {
    (0..word.len()).any(|i| is_vowel(word, i))
}

pub fn ends_with_double_consonant(word: &[u8]) -> bool {
    let len = word.len();
    len >= 2 && word[len - 1] == word[len - 2] && !is_vowel(word, len - 1)
}

/// Consonant-vowel-consonant ending where the last consonant is not w, x or y.
pub fn ends_with_cvc(word: &[u8]) -> bool {
    let len = word.len();
    if len < 3 {
        return false;
    }

    !is_vowel(word, len - 3)
        && is_vowel(word, len - 2)
        && !is_vowel(word, len - 1)
        && !matches!(word[len - 1], b'w' | b'x' | b'y')
}

/// Plurals.
fn step1a(word: &mut String) {
    if word.ends_with("sses") || word.ends_with("ies") {
        word.truncate(word.len() - 2);
    } else if word.ends_with("ss") {
        // keep
    } else if word.ends_with('s') {
        word.pop();
    }
}

/// Past tense and progressive forms, plus the cleanup that restores
/// "hop" from "hopping" and "file" from "filing".
fn step1b(word: &mut String) {
    if word.ends_with("eed") {
        if measure(&word.as_bytes()[..word.len() - 3]) > 0 {
            word.pop();
        }
        return;
    }

    let suffix_len = if word.ends_with("ed") {
        2
    } else if word.ends_with("ing") {
        3
    } else {
        return;
    };

    let stem_len = word.len() - suffix_len;
    if !contains_vowel(&word.as_bytes()[..stem_len]) {
        return;
    }
    word.truncate(stem_len);

    if word.ends_with("at") || word.ends_with("bl") || word.ends_with("iz") {
        word.push('e');
    } else if ends_with_double_consonant(word.as_bytes())
        && !matches!(word.as_bytes()[word.len() - 1], b'l' | b's' | b'z')
    {
        word.pop();
    } else if measure(word.as_bytes()) == 1 && ends_with_cvc(word.as_bytes()) {
        word.push('e');
    }
}

fn step1c(word: &mut String) {
    let bytes = word.as_bytes();
    let len = bytes.len();
    if len > 2 && bytes[len - 1] == b'y' && !is_vowel(bytes, len - 2) {
        word.pop();
        word.push('i');
    }
}

/// Apply the first rule whose suffix matches and whose stem has a positive
/// measure. A matching suffix that fails the gate does not stop the scan.
fn replace_first(word: &mut String, rules: &[(&str, &str)]) {
    for (suffix, replacement) in rules {
        if !word.ends_with(suffix) {
            continue;
        }
        let stem_len = word.len() - suffix.len();
        if measure(&word.as_bytes()[..stem_len]) > 0 {
            word.truncate(stem_len);
            word.push_str(replacement);
            return;
        }
    }
}

fn step4(word: &mut String) {
    for suffix in STEP4_SUFFIXES {
        if !word.ends_with(suffix) {
            continue;
        }
        let stem = &word.as_bytes()[..word.len() - suffix.len()];

        let strip = if *suffix == "ion" {
            matches!(stem.last(), Some(b's') | Some(b't')) && measure(stem) > 1
        } else {
            measure(stem) > 1
        };

        if strip {
            let stem_len = stem.len();
            word.truncate(stem_len);
            return;
        }
    }
}

/// Trailing `e` and doubled `l`.
fn step5(word: &mut String) {
    if word.ends_with('e') {
        let stem = &word.as_bytes()[..word.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_with_cvc(stem)) {
            word.pop();
        }
    }

    if word.ends_with("ll") && measure(word.as_bytes()) > 1 {
        word.pop();
    }
}
