//! Per-language prompt template pairs.
//!
//! Adding a language means adding one `TemplatePair` const and one match arm
//! in `for_language`; everything else is language-agnostic.

pub const DEFAULT_LANGUAGE: &str = "en";

/// Static text surrounding the assembled prompt for one language.
pub struct TemplatePair {
    /// System-prompt body, before the trusted-URL block is appended.
    pub system: &'static str,
    /// Instruction that pins answers to the URL allow-list.
    pub url_policy: &'static str,
    /// Heading printed above the trusted-URL list.
    pub url_heading: &'static str,
    /// Opening of the user prompt.
    pub scaffold: &'static str,
    /// Heading above the prior-turn transcript.
    pub history_heading: &'static str,
    /// Heading above the retrieved context block.
    pub context_heading: &'static str,
    /// Heading above the literal question.
    pub question_heading: &'static str,
    pub user_label: &'static str,
    pub assistant_label: &'static str,
}

const ENGLISH: TemplatePair = TemplatePair {
    system: "You are a technical documentation assistant for wind turbine \
operators. Answer questions using only the provided source passages. Cite \
the passages you used as [Source i]. If the sources do not contain the \
answer, say so plainly instead of guessing.",
    url_policy: "When referencing documents, use only URLs that appear in \
the reference list below, copied character for character. Any URL not in \
this list must not appear in your answer.",
    url_heading: "Reference list of permitted document URLs:",
    scaffold: "Answer the question below using the provided sources.",
    history_heading: "Conversation so far:",
    context_heading: "Sources:",
    question_heading: "Question:",
    user_label: "User",
    assistant_label: "Assistant",
};

const GERMAN: TemplatePair = TemplatePair {
    system: "Du bist ein technischer Dokumentationsassistent für Betreiber \
von Windenergieanlagen. Beantworte Fragen ausschließlich anhand der \
bereitgestellten Quellenabschnitte. Zitiere die verwendeten Abschnitte als \
[Source i]. Wenn die Quellen keine Antwort enthalten, sage das offen, statt \
zu raten.",
    url_policy: "Verwende beim Verweis auf Dokumente nur URLs aus der unten \
stehenden Referenzliste, Zeichen für Zeichen übernommen. URLs, die nicht in \
dieser Liste stehen, dürfen in der Antwort nicht vorkommen.",
    url_heading: "Referenzliste der zulässigen Dokument-URLs:",
    scaffold: "Beantworte die folgende Frage anhand der bereitgestellten \
Quellen.",
    history_heading: "Bisheriger Gesprächsverlauf:",
    context_heading: "Quellen:",
    question_heading: "Frage:",
    user_label: "Nutzer",
    assistant_label: "Assistent",
};

/// Resolve a language code to its template pair. Unknown codes fall back to
/// English; region subtags ("de-AT") resolve to their primary language.
pub fn for_language(code: &str) -> &'static TemplatePair {
    let primary = code
        .trim()
        .to_ascii_lowercase()
        .split(['-', '_'])
        .next()
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string();

    match primary.as_str() {
        "de" => &GERMAN,
        _ => &ENGLISH,
    }
}
