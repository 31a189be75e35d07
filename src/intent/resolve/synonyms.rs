/// Keyword cluster mapped to one canonical action. Matching is "any literal
/// substring present" on the normalized input, not tokenized.
#[derive(Debug, Clone, Copy)]
pub struct SynonymGroup {
    pub key: &'static str,
    pub triggers: &'static [&'static str],
}

pub const SYNONYM_GROUPS: &[SynonymGroup] = &[
    SynonymGroup {
        key: "create",
        triggers: &[
            "erstelle", "erstell", "anlegen", "lege an", "leg an", "hinzufügen", "füge", "neue",
            "neuer", "neues", "notiere", "create", "add", "new",
        ],
    },
    SynonymGroup {
        key: "meeting",
        triggers: &["meeting", "termin", "besprechung", "call", "telko", "call mit"],
    },
    SynonymGroup {
        key: "recurring",
        triggers: &[
            "jeden", "jede ", "jedes", "täglich", "wöchentlich", "monatlich", "werktags",
            "every", "daily", "weekly", "monthly",
        ],
    },
    SynonymGroup {
        key: "move",
        triggers: &[
            "verschiebe", "verschieb", "schiebe", "verlege", "später", "move", "postpone",
            "reschedule",
        ],
    },
    SynonymGroup {
        key: "delete",
        triggers: &[
            "lösche", "lösch", "entferne", "streiche", "weg damit", "delete", "remove", "discard",
        ],
    },
    SynonymGroup {
        key: "priority",
        triggers: &["priorität", "prio", "wichtig", "dringend", "priority", "urgent"],
    },
    SynonymGroup {
        key: "template",
        triggers: &["vorlage", "template", "schablone"],
    },
    SynonymGroup {
        key: "question",
        triggers: &["was ", "wie ", "welche", "wann", "zeig", "liste", "what", "how", "which", "?"],
    },
    SynonymGroup {
        key: "stats",
        triggers: &["statistik", "übersicht", "wie viele", "wieviele", "anzahl", "stats", "how many"],
    },
    SynonymGroup {
        key: "help",
        triggers: &["hilfe", "help", "was kannst du", "erkläre", "funktionen", "befehle"],
    },
    SynonymGroup {
        key: "pattern",
        triggers: &["muster", "pattern", "auffällig", "vorschläge", "gewohnheit"],
    },
    SynonymGroup {
        key: "optional",
        triggers: &["optional", "nicht so wichtig", "kann warten"],
    },
];

pub fn group(key: &str) -> Option<&'static SynonymGroup> {
    SYNONYM_GROUPS.iter().find(|g| g.key == key)
}

pub fn matches_group(normalized: &str, key: &str) -> bool {
    group(key).map_or(false, |g| g.triggers.iter().any(|t| normalized.contains(t)))
}

/// Number of the listed groups with at least one trigger present.
pub fn count_matching(normalized: &str, keys: &[&str]) -> usize {
    keys.iter().filter(|k| matches_group(normalized, k)).count()
}
