//! Suppression rules.
//!
//! A [`Rule`] is a set of predicates over the fields of a [`NotificationRequest`]. A request matches
//! a rule if every predicate of that rule holds, and it is suppressed if it matches any rule of the
//! [`RuleSet`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{HintValue, NotificationRequest};

/// Expected value(s) of a plain string field: either one exact value, or a list of which any one
/// has to match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMatch {
    One(String),
    AnyOf(Vec<String>),
}

impl FieldMatch {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            FieldMatch::One(expected) => expected == value,
            FieldMatch::AnyOf(expected) => expected.iter().any(|x| x == value),
        }
    }
}

impl From<&str> for FieldMatch {
    fn from(s: &str) -> Self {
        FieldMatch::One(s.to_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_icon: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<FieldMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<FieldMatch>,
    /// Every listed hint has to be present in the request with an equal value.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub hints: HashMap<String, HintValue>,
}

impl Rule {
    pub fn app_name(name: &str) -> Self {
        Rule { app_name: Some(name.into()), ..Default::default() }
    }

    pub fn hint(key: &str, value: impl Into<HintValue>) -> Self {
        Rule { hints: HashMap::from([(key.to_owned(), value.into())]), ..Default::default() }
    }

    /// A rule without any predicate. It matches every request.
    pub fn is_empty(&self) -> bool {
        self.sender.is_none()
            && self.app_name.is_none()
            && self.app_icon.is_none()
            && self.summary.is_none()
            && self.body.is_none()
            && self.hints.is_empty()
    }

    pub fn matches(&self, request: &NotificationRequest) -> bool {
        let fields = [
            (&self.sender, &request.sender),
            (&self.app_name, &request.app_name),
            (&self.app_icon, &request.app_icon),
            (&self.summary, &request.summary),
            (&self.body, &request.body),
        ];
        let fields_match = fields.iter().all(|&(predicate, value)| match predicate {
            Some(predicate) => predicate.matches(value),
            None => true,
        });

        fields_match && self.hints.iter().all(|(key, expected)| request.hints.get(key).is_some_and(|actual| actual == expected))
    }
}

/// The configured suppression rules, in configuration order. Static once constructed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        for (idx, rule) in rules.iter().enumerate() {
            if rule.is_empty() {
                log::warn!("Ignore rule #{} has no conditions and will suppress every notification", idx);
            }
        }
        Self { rules }
    }

    /// Whether `request` matches any of the rules.
    pub fn matches(&self, request: &NotificationRequest) -> bool {
        self.matching_rule(request).is_some()
    }

    /// The first rule, in configuration order, that `request` matches.
    pub fn matching_rule(&self, request: &NotificationRequest) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(request))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use pretty_assertions::assert_eq;

    fn mail() -> NotificationRequest {
        NotificationRequest::new("Thunderbird", "New mail", "From: bob").with_hint("category", "email.arrived").with_hint("urgency", 1i64)
    }

    #[test]
    fn test_app_name_rule() {
        let rules = RuleSet::new(vec![Rule::app_name("Spammer")]);
        assert!(rules.matches(&NotificationRequest::new("Spammer", "anything", "at all")));
        assert!(rules.matches(&NotificationRequest::new("Spammer", "", "").with_hint("urgency", 2i64)));
        assert!(!rules.matches(&NotificationRequest::new("spammer", "", "")));
    }

    #[test]
    fn test_hint_rule() {
        let rules = RuleSet::new(vec![Rule::hint("category", "email.arrived")]);
        assert!(rules.matches(&mail()));
        assert!(!rules.matches(&NotificationRequest::new("Thunderbird", "New mail", "From: bob")));
        assert!(!rules.matches(&NotificationRequest::new("Thunderbird", "", "").with_hint("category", "im")));
        assert!(!rules.matches(&NotificationRequest::new("Thunderbird", "", "").with_hint("category", true)));
    }

    #[test]
    fn test_all_predicates_must_hold() {
        let rule = Rule { app_name: Some("Thunderbird".into()), summary: Some("Other".into()), ..Default::default() };
        assert!(!rule.matches(&mail()));

        let rule = Rule {
            app_name: Some(FieldMatch::AnyOf(vec!["Evolution".to_owned(), "Thunderbird".to_owned()])),
            hints: hashmap! { "urgency".to_owned() => HintValue::Int(1) },
            ..Default::default()
        };
        assert!(rule.matches(&mail()));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = RuleSet::new(vec![Rule::app_name("Slack"), Rule::hint("urgency", 1i64), Rule::app_name("Thunderbird")]);
        assert_eq!(Some(&Rule::hint("urgency", 1i64)), rules.matching_rule(&mail()));
    }

    #[test]
    fn test_empty_rule_matches_everything() {
        assert!(Rule::default().is_empty());
        assert!(RuleSet::new(vec![Rule::default()]).matches(&mail()));
        assert!(!RuleSet::default().matches(&mail()));
    }

    #[test]
    fn test_deserialize_rules() {
        let rules: Vec<Rule> = serde_json::from_str(
            r#"[
                { "app_name": "Spammer" },
                { "app_name": ["a", "b"], "hints": { "category": "email", "urgency": 2, "transient": true } }
            ]"#,
        )
        .unwrap();
        assert_eq!(Rule::app_name("Spammer"), rules[0]);
        assert_eq!(Some(FieldMatch::AnyOf(vec!["a".to_owned(), "b".to_owned()])), rules[1].app_name);
        assert_eq!(
            hashmap! {
                "category".to_owned() => HintValue::from("email"),
                "urgency".to_owned() => HintValue::Int(2),
                "transient".to_owned() => HintValue::Bool(true),
            },
            rules[1].hints
        );
        assert!(serde_json::from_str::<Rule>(r#"{ "appname": "typo" }"#).is_err());
    }
}
