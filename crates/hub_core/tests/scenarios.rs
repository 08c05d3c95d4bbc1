use std::sync::mpsc::{channel, Receiver};

use hub_core::*;
use pretty_assertions::assert_eq;

fn hub(rules: Vec<Rule>) -> (Hub, Receiver<Event>) {
    let (send, recv) = channel();
    (Hub::new(NotificationSession::new(RuleSet::new(rules), Box::new(send))), recv)
}

fn thread(hub: &Hub, key: &str) -> Option<ThreadSnapshot> {
    hub.threads().into_iter().find(|t| t.key.as_str() == key)
}

#[test]
fn mail_label_uses_body_when_summary_repeats_app_name() {
    let (hub, events) = hub(vec![]);
    let outcome = hub.notify(NotificationRequest::new("Mail", "Mail", "You have 3 new messages")).unwrap();
    assert_eq!(1, outcome.id);
    assert_eq!("Mail: You have 3 new messages", thread(&hub, "Mail").unwrap().label);
    assert_eq!(
        Event::ThreadOpened { key: ThreadKey::from("Mail"), label: "Mail: You have 3 new messages".to_owned() },
        events.recv().unwrap()
    );
}

#[test]
fn chat_messages_share_a_thread() {
    let (hub, _events) = hub(vec![]);
    assert_eq!(1, hub.notify(NotificationRequest::new("Chat", "Alice: hi", "")).unwrap().id);
    assert_eq!(2, hub.notify(NotificationRequest::new("Chat", "Bob: hey", "")).unwrap().id);

    let chat = thread(&hub, "Chat").unwrap();
    assert_eq!(vec![1, 2], chat.members);
    assert_eq!("Chat: Bob: hey", chat.label);
    assert_eq!(1, hub.threads().len());

    hub.close(1, CloseReason::Dismissed);
    assert_eq!(vec![2], thread(&hub, "Chat").unwrap().members);

    hub.close(2, CloseReason::Dismissed);
    assert_eq!(None, thread(&hub, "Chat"));
    assert_eq!(Status::Passive, hub.status());
}

#[test]
fn desktop_entry_takes_precedence_over_app_name() {
    let (hub, _events) = hub(vec![]);
    hub.notify(NotificationRequest::new("Firefox", "a", "").with_hint(HINT_DESKTOP_ENTRY, "firefox")).unwrap();
    hub.notify(NotificationRequest::new("Firefox Nightly", "b", "").with_hint(HINT_DESKTOP_ENTRY, "firefox")).unwrap();
    assert_eq!(vec![1, 2], thread(&hub, "firefox").unwrap().members);
}

#[test]
fn ignored_app_still_gets_an_id() {
    let (hub, events) = hub(vec![Rule::app_name("Spammer")]);
    hub.notify(NotificationRequest::new("Legit", "hi", "")).unwrap();
    let count = hub.count();
    let _ = events.try_iter().count();

    let outcome = hub.notify(NotificationRequest::new("Spammer", "Buy now", "")).unwrap();
    assert_eq!(2, outcome.id);
    assert_eq!(Disposition::Suppressed, outcome.disposition);
    assert_eq!(count, hub.count());
    assert_eq!(None, thread(&hub, "Spammer"));
    assert_eq!(0, events.try_iter().count());
}

#[test]
fn hint_rule_only_suppresses_matching_category() {
    let (hub, _events) = hub(vec![Rule::hint("category", "email")]);
    let email = hub.notify(NotificationRequest::new("Mail", "x", "").with_hint("category", "email")).unwrap();
    let im = hub.notify(NotificationRequest::new("Mail", "x", "").with_hint("category", "im")).unwrap();
    let plain = hub.notify(NotificationRequest::new("Mail", "x", "")).unwrap();
    assert_eq!(Disposition::Suppressed, email.disposition);
    assert_eq!(Disposition::Created, im.disposition);
    assert_eq!(Disposition::Created, plain.disposition);
    assert_eq!(2, hub.count());
}

#[test]
fn replace_keeps_identifier_and_count() {
    let (hub, _events) = hub(vec![]);
    let id = hub.notify(NotificationRequest::new("Player", "Song A", "")).unwrap().id;
    hub.notify(NotificationRequest::new("Other", "x", "")).unwrap();
    let before = hub.list();

    let outcome = hub.notify(NotificationRequest::new("Player", "Song B", "").replacing(id)).unwrap();
    assert_eq!(id, outcome.id);
    assert_eq!(before.len(), hub.list().len());
    assert_eq!("Song B", hub.get(id).unwrap().summary);
}

#[test]
fn closed_identifiers_are_not_resurrected() {
    let (hub, _events) = hub(vec![]);
    let id = hub.notify(NotificationRequest::new("App", "a", "")).unwrap().id;
    hub.close(id, CloseReason::Expired);
    let outcome = hub.notify(NotificationRequest::new("App", "b", "").replacing(id)).unwrap();
    assert_ne!(id, outcome.id);
    assert_eq!(Disposition::Created, outcome.disposition);
}

#[test]
fn count_tracks_open_notifications() {
    let (hub, events) = hub(vec![]);
    let ids: Vec<u32> = (0..6).map(|i| hub.notify(NotificationRequest::new("App", i.to_string(), "")).unwrap().id).collect();
    for id in ids.iter().step_by(2) {
        hub.close(*id, CloseReason::ClosedByCall);
    }
    assert_eq!(3, hub.count());
    assert_eq!(3, hub.list().len());

    let last_count = events.try_iter().filter_map(|e| if let Event::Changed { count } = e { Some(count) } else { None }).last();
    assert_eq!(Some(3), last_count);
}
