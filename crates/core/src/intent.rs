use crate::dialog::DialogResponse;

/// Intents with an enrichment handler behind them. Adding one is a table edit
/// here plus a dispatcher arm, not a new chained conditional.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentKind {
    Price,
    Sentiment,
    ViewArticles,
}

const INTENT_TABLE: &[(&str, IntentKind)] = &[
    ("price", IntentKind::Price),
    ("sentiment", IntentKind::Sentiment),
    ("view_articles", IntentKind::ViewArticles),
];

impl IntentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        INTENT_TABLE.iter().find(|(known, _)| *known == name).map(|(_, kind)| *kind)
    }

    /// Classifies the top intent of a response. A missing or empty intent
    /// list disables every enrichment branch.
    pub fn from_response(response: &DialogResponse) -> Option<Self> {
        response.top_intent().and_then(Self::from_name)
    }
}

#[cfg(test)]
mod tests {
    use super::IntentKind;
    use crate::dialog::{DialogResponse, Intent};

    #[test]
    fn known_intents_map_to_variants() {
        assert_eq!(IntentKind::from_name("price"), Some(IntentKind::Price));
        assert_eq!(IntentKind::from_name("sentiment"), Some(IntentKind::Sentiment));
        assert_eq!(IntentKind::from_name("view_articles"), Some(IntentKind::ViewArticles));
        assert_eq!(IntentKind::from_name("weather"), None);
    }

    #[test]
    fn empty_intent_list_disables_dispatch() {
        let response = DialogResponse::default();
        assert_eq!(IntentKind::from_response(&response), None);
    }

    #[test]
    fn only_the_top_intent_counts() {
        let mut response = DialogResponse::default();
        response.intents = vec![
            Intent { intent: "greeting".into(), confidence: 0.9 },
            Intent { intent: "price".into(), confidence: 0.8 },
        ];
        assert_eq!(IntentKind::from_response(&response), None);
    }
}
