//! Event-channel protocol and room registry.
//!
//! Frames are JSON text `{"event": <name>, "data": <payload>}`. Inbound
//! frames are parsed by [`parse_inbound`] and answered by [`handle_event`];
//! room updates fan out through [`EventHub`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::metrics;
use super::state::AppState;
use crate::catalog::room_name;
use crate::storage::StudentRecord;
use crate::students::Envelope;

/// Transport label for logs and metrics.
pub const TRANSPORT: &str = "socket";

/// Event names a client may send.
pub const AVAILABLE_EVENTS: [&str; 3] =
    ["get-students", "subscribe-to-course", "unsubscribe-from-course"];

/// A payload value as sent by the client.
///
/// Clients send semesters as numbers or strings; both go through the same
/// textual validation. Any other JSON value is kept as its JSON text so the
/// resolver reports it as an invalid course or semester.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Other(Value),
}

impl Scalar {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Correlation id from a raw payload, whatever its JSON type.
fn request_id_of(data: &Value) -> Option<String> {
    match data.get("requestId")? {
        Value::Null => None,
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

/// A frame that could not be turned into an [`InboundEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFrame {
    pub reason: String,
    /// `data.requestId`, when the frame carried one.
    pub request_id: Option<String>,
}

impl RejectedFrame {
    /// The `student-error` reply for this frame.
    #[must_use]
    pub fn into_reply(self) -> OutboundEvent {
        OutboundEvent::invalid(self.reason, self.request_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentsRequest {
    #[serde(default)]
    pub course: Option<Scalar>,
    #[serde(default)]
    pub semester: Option<Scalar>,
    #[serde(default)]
    pub request_id: Option<Scalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub course: Option<Scalar>,
    #[serde(default)]
    pub semester: Option<Scalar>,
}

/// Parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    GetStudents(StudentsRequest),
    SubscribeToCourse(CourseRequest),
    UnsubscribeFromCourse(CourseRequest),
}

impl InboundEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetStudents(_) => "get-students",
            Self::SubscribeToCourse(_) => "subscribe-to-course",
            Self::UnsubscribeFromCourse(_) => "unsubscribe-from-course",
        }
    }
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, String> {
    let data = if data.is_null() {
        Value::Object(Map::new())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|e| format!("Invalid payload for '{event}': {e}"))
}

/// Parse one text frame.
///
/// # Errors
///
/// A client-facing reason when the frame is not JSON, names an unknown
/// event, or carries a payload that is not an object. The rejection keeps
/// `data.requestId` whenever the frame is JSON.
pub fn parse_inbound(text: &str) -> Result<InboundEvent, RejectedFrame> {
    let raw: Value = serde_json::from_str(text).map_err(|e| RejectedFrame {
        reason: format!("Malformed event frame: {e}"),
        request_id: None,
    })?;
    let request_id = raw.get("data").and_then(request_id_of);
    let reject = |reason: String| RejectedFrame {
        reason,
        request_id: request_id.clone(),
    };

    let frame: Frame =
        serde_json::from_value(raw).map_err(|e| reject(format!("Malformed event frame: {e}")))?;

    match frame.event.as_str() {
        "get-students" => payload(&frame.event, frame.data).map(InboundEvent::GetStudents),
        "subscribe-to-course" => {
            payload(&frame.event, frame.data).map(InboundEvent::SubscribeToCourse)
        }
        "unsubscribe-from-course" => {
            payload(&frame.event, frame.data).map(InboundEvent::UnsubscribeFromCourse)
        }
        other => Err(format!("Unknown event '{other}'")),
    }
    .map_err(reject)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub message: String,
    pub socket_id: String,
    pub timestamp: DateTime<Utc>,
    pub available_events: Vec<&'static str>,
}

impl ConnectedPayload {
    #[must_use]
    pub fn new(socket_id: &str) -> Self {
        Self {
            message: "Connected to student records socket".to_string(),
            socket_id: socket_id.to_string(),
            timestamp: Utc::now(),
            available_events: AVAILABLE_EVENTS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPayload {
    pub room: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Update pushed to a room: the caller's fields plus routing keys.
#[derive(Debug, Clone, Serialize)]
pub struct StudentUpdate {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub course: String,
    pub semester: u8,
    pub timestamp: DateTime<Utc>,
}

/// Outbound frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    Connected(ConnectedPayload),
    StudentsData(Envelope<Vec<StudentRecord>>),
    StudentError(Envelope<Vec<StudentRecord>>),
    SubscriptionConfirmed(SubscriptionPayload),
    UnsubscriptionConfirmed(SubscriptionPayload),
    StudentUpdate(StudentUpdate),
}

impl OutboundEvent {
    /// `student-error` for a frame that could not be understood.
    #[must_use]
    pub fn invalid(reason: impl Into<String>, request_id: Option<String>) -> Self {
        metrics::record_failure(TRANSPORT, crate::students::ErrorCode::InvalidEvent);
        Self::StudentError(Envelope::invalid_event(reason).with_request_id(request_id))
    }
}

/// Update addressed to one room.
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub room: String,
    pub update: StudentUpdate,
}

/// Room membership registry plus the fan-out channel.
#[derive(Debug, Clone)]
pub struct EventHub {
    updates: broadcast::Sender<RoomBroadcast>,
    rooms: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(256);
        Self {
            updates,
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Receiver for room updates. Each socket holds one.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RoomBroadcast> {
        self.updates.subscribe()
    }

    /// Add `client_id` to `room`. Returns false if already a member.
    pub fn join(&self, room: &str, client_id: &str) -> bool {
        self.rooms
            .write()
            .entry(room.to_string())
            .or_default()
            .insert(client_id.to_string())
    }

    /// Remove `client_id` from `room`. Returns false if it was not a member.
    pub fn leave(&self, room: &str, client_id: &str) -> bool {
        let mut rooms = self.rooms.write();
        let Some(members) = rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(client_id);
        if members.is_empty() {
            rooms.remove(room);
        }
        removed
    }

    /// Drop every membership held by `client_id`.
    pub fn leave_all(&self, client_id: &str) {
        let mut rooms = self.rooms.write();
        rooms.retain(|_, members| {
            members.remove(client_id);
            !members.is_empty()
        });
    }

    #[must_use]
    pub fn is_member(&self, room: &str, client_id: &str) -> bool {
        self.rooms
            .read()
            .get(room)
            .is_some_and(|members| members.contains(client_id))
    }

    /// Number of sockets subscribed to a course/semester room.
    #[must_use]
    pub fn connected_clients(&self, course: &str, semester: u8) -> usize {
        self.rooms
            .read()
            .get(&room_name(&course.trim().to_uppercase(), semester))
            .map_or(0, HashSet::len)
    }

    /// Push a `student-update` to every member of the course/semester room.
    ///
    /// Returns the number of room members at send time.
    pub fn broadcast_student_update(
        &self,
        course: &str,
        semester: u8,
        mut fields: Map<String, Value>,
    ) -> usize {
        for key in ["course", "semester", "timestamp"] {
            fields.remove(key);
        }
        let course = course.trim().to_uppercase();
        let room = room_name(&course, semester);
        let members = self.connected_clients(&course, semester);

        let update = StudentUpdate {
            fields,
            course,
            semester,
            timestamp: Utc::now(),
        };

        // No receivers just means no sockets are open.
        if self.updates.send(RoomBroadcast { room: room.clone(), update }).is_err() {
            tracing::debug!(%room, "No open sockets for update");
        } else {
            tracing::debug!(%room, members, "Broadcast student update");
        }
        members
    }
}

/// Answer one inbound event for `client_id`.
pub async fn handle_event(state: &AppState, client_id: &str, event: InboundEvent) -> OutboundEvent {
    match event {
        InboundEvent::GetStudents(request) => get_students(state, request).await,
        InboundEvent::SubscribeToCourse(request) => subscribe(state, client_id, request),
        InboundEvent::UnsubscribeFromCourse(request) => unsubscribe(state, client_id, request),
    }
}

async fn get_students(state: &AppState, request: StudentsRequest) -> OutboundEvent {
    let request_id = request.request_id.map(Scalar::into_text);
    let course = request.course.map(Scalar::into_text);
    let semester = request.semester.map(Scalar::into_text);

    let _timer = metrics::REQUEST_LATENCY
        .with_label_values(&["socket_get_students"])
        .start_timer();

    match state
        .resolver
        .run(move |resolver| resolver.resolve(course.as_deref(), semester.as_deref()))
        .await
    {
        Ok(listing) => {
            metrics::record_success(TRANSPORT, listing.students.len());
            OutboundEvent::StudentsData(listing.into_envelope().with_request_id(request_id))
        }
        Err(err) => {
            OutboundEvent::StudentError(state.failure(&err, TRANSPORT).with_request_id(request_id))
        }
    }
}

fn subscribe(state: &AppState, client_id: &str, request: CourseRequest) -> OutboundEvent {
    let course = request.course.map(Scalar::into_text);
    let semester = request.semester.map(Scalar::into_text);

    match state.resolver.validate(course.as_deref(), semester.as_deref()) {
        Ok(query) => {
            let room = query.room();
            state.hub.join(&room, client_id);
            tracing::info!(client_id, %room, "Client subscribed");
            OutboundEvent::SubscriptionConfirmed(SubscriptionPayload {
                message: format!(
                    "Subscribed to {} semester {}",
                    query.course.display_name, query.semester
                ),
                room,
                timestamp: Utc::now(),
            })
        }
        Err(err) => OutboundEvent::StudentError(state.failure(&err, TRANSPORT)),
    }
}

fn unsubscribe(state: &AppState, client_id: &str, request: CourseRequest) -> OutboundEvent {
    let course = request.course.map(Scalar::into_text);
    let semester = request.semester.map(Scalar::into_text);

    match state.resolver.validate(course.as_deref(), semester.as_deref()) {
        Ok(query) => {
            let room = query.room();
            state.hub.leave(&room, client_id);
            tracing::info!(client_id, %room, "Client unsubscribed");
            OutboundEvent::UnsubscriptionConfirmed(SubscriptionPayload {
                message: format!(
                    "Unsubscribed from {} semester {}",
                    query.course.display_name, query.semester
                ),
                room,
                timestamp: Utc::now(),
            })
        }
        Err(err) => OutboundEvent::StudentError(state.failure(&err, TRANSPORT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Environment;
    use crate::students::{ErrorCode, FixtureSource, StudentQueryResolver};

    fn test_state() -> AppState {
        let resolver = StudentQueryResolver::new(
            Arc::new(Catalog::standard()),
            Arc::new(FixtureSource::standard()),
        );
        AppState::new(resolver, Environment::Production)
    }

    fn to_json(event: &OutboundEvent) -> Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn test_parse_get_students_numeric_semester() {
        let event =
            parse_inbound(r#"{"event":"get-students","data":{"course":"CSE","semester":1,"requestId":"r1"}}"#)
                .unwrap();
        let InboundEvent::GetStudents(request) = event else {
            panic!("expected get-students");
        };
        assert_eq!(request.semester.map(Scalar::into_text).as_deref(), Some("1"));
        assert_eq!(request.request_id.map(Scalar::into_text).as_deref(), Some("r1"));
    }

    #[test]
    fn test_parse_missing_data_is_empty_request() {
        let event = parse_inbound(r#"{"event":"get-students"}"#).unwrap();
        assert_eq!(event, InboundEvent::GetStudents(StudentsRequest::default()));
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        let err = parse_inbound(r#"{"event":"delete-students","data":{"requestId":"r9"}}"#)
            .unwrap_err();
        assert!(err.reason.contains("delete-students"));
        assert_eq!(err.request_id.as_deref(), Some("r9"));

        let err = parse_inbound("not json").unwrap_err();
        assert!(err.request_id.is_none());

        let err = parse_inbound(r#"{"data":{"requestId":4}}"#).unwrap_err();
        assert_eq!(err.request_id.as_deref(), Some("4"));

        let err = parse_inbound(r#"{"event":"get-students","data":"CSE"}"#).unwrap_err();
        assert!(err.reason.contains("get-students"));
    }

    #[test]
    fn test_parse_keeps_wrongly_typed_values() {
        let event = parse_inbound(
            r#"{"event":"get-students","data":{"course":true,"semester":1,"requestId":{"n":1}}}"#,
        )
        .unwrap();
        let InboundEvent::GetStudents(request) = event else {
            panic!("expected get-students");
        };
        assert_eq!(request.course.map(Scalar::into_text).as_deref(), Some("true"));
        assert_eq!(
            request.request_id.map(Scalar::into_text).as_deref(),
            Some(r#"{"n":1}"#)
        );
    }

    #[tokio::test]
    async fn test_wrongly_typed_course_is_invalid_course() {
        let state = test_state();
        let event = parse_inbound(
            r#"{"event":"get-students","data":{"course":true,"semester":1,"requestId":"r3"}}"#,
        )
        .unwrap();

        let reply = handle_event(&state, "c1", event).await;
        let OutboundEvent::StudentError(envelope) = &reply else {
            panic!("expected student-error");
        };
        assert_eq!(envelope.code(), Some(ErrorCode::InvalidCourse));
        assert_eq!(envelope.meta().request_id.as_deref(), Some("r3"));
    }

    #[test]
    fn test_outbound_event_names() {
        let connected = to_json(&OutboundEvent::Connected(ConnectedPayload::new("abc")));
        assert_eq!(connected["event"], "connected");
        assert_eq!(connected["data"]["socketId"], "abc");
        assert_eq!(connected["data"]["availableEvents"][0], "get-students");

        let invalid = to_json(&OutboundEvent::invalid("bad frame", Some("r1".to_string())));
        assert_eq!(invalid["event"], "student-error");
        assert_eq!(invalid["data"]["error"]["code"], "INVALID_EVENT");
        assert_eq!(invalid["data"]["meta"]["requestId"], "r1");
    }

    #[tokio::test]
    async fn test_get_students_echoes_request_id() {
        let state = test_state();
        let request = StudentsRequest {
            course: Some(Scalar::Text("CSE".to_string())),
            semester: Some(Scalar::Number(1u8.into())),
            request_id: Some(Scalar::Text("req-7".to_string())),
        };

        let reply = to_json(&handle_event(&state, "c1", InboundEvent::GetStudents(request)).await);
        assert_eq!(reply["event"], "students-data");
        assert_eq!(reply["data"]["success"], true);
        assert_eq!(reply["data"]["data"].as_array().unwrap().len(), 3);
        assert_eq!(reply["data"]["meta"]["requestId"], "req-7");
    }

    #[tokio::test]
    async fn test_get_students_failure_echoes_request_id() {
        let state = test_state();
        let request = StudentsRequest {
            course: None,
            semester: None,
            request_id: Some(Scalar::Text("req-8".to_string())),
        };

        let reply = handle_event(&state, "c1", InboundEvent::GetStudents(request)).await;
        let OutboundEvent::StudentError(envelope) = &reply else {
            panic!("expected student-error");
        };
        assert_eq!(envelope.code(), Some(ErrorCode::MissingParameters));
        assert_eq!(envelope.meta().request_id.as_deref(), Some("req-8"));
        assert!(envelope.data().is_none());
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let state = test_state();
        let request = CourseRequest {
            course: Some(Scalar::Text("ece".to_string())),
            semester: Some(Scalar::Number(2u8.into())),
        };

        let reply = to_json(
            &handle_event(&state, "c1", InboundEvent::SubscribeToCourse(request.clone())).await,
        );
        assert_eq!(reply["event"], "subscription-confirmed");
        assert_eq!(reply["data"]["room"], "ECE_2");
        assert_eq!(state.hub.connected_clients("ECE", 2), 1);

        let reply =
            to_json(&handle_event(&state, "c1", InboundEvent::UnsubscribeFromCourse(request)).await);
        assert_eq!(reply["event"], "unsubscription-confirmed");
        assert_eq!(state.hub.connected_clients("ECE", 2), 0);
    }

    #[tokio::test]
    async fn test_subscribe_validates_input() {
        let state = test_state();
        let request = CourseRequest {
            course: Some(Scalar::Text("XYZ".to_string())),
            semester: Some(Scalar::Number(1u8.into())),
        };

        let reply = handle_event(&state, "c1", InboundEvent::SubscribeToCourse(request)).await;
        let OutboundEvent::StudentError(envelope) = &reply else {
            panic!("expected student-error");
        };
        assert_eq!(envelope.code(), Some(ErrorCode::InvalidCourse));
        assert_eq!(state.hub.connected_clients("XYZ", 1), 0);
    }

    #[test]
    fn test_hub_membership() {
        let hub = EventHub::new();
        assert!(hub.join("CSE_1", "a"));
        assert!(!hub.join("CSE_1", "a"));
        assert!(hub.join("CSE_1", "b"));
        assert!(hub.join("ME_1", "a"));
        assert_eq!(hub.connected_clients("CSE", 1), 2);

        hub.leave_all("a");
        assert!(!hub.is_member("CSE_1", "a"));
        assert!(hub.is_member("CSE_1", "b"));
        assert_eq!(hub.connected_clients("ME", 1), 0);

        assert!(!hub.leave("EE_1", "b"));
        assert!(hub.leave("CSE_1", "b"));
        assert_eq!(hub.connected_clients("CSE", 1), 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_receivers() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        hub.join("CSE_1", "a");

        let mut fields = Map::new();
        fields.insert("studentId".to_string(), Value::from("CSE001"));
        let members = hub.broadcast_student_update("cse", 1, fields);
        assert_eq!(members, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.room, "CSE_1");

        let json = to_json(&OutboundEvent::StudentUpdate(received.update));
        assert_eq!(json["event"], "student-update");
        assert_eq!(json["data"]["studentId"], "CSE001");
        assert_eq!(json["data"]["course"], "CSE");
        assert_eq!(json["data"]["semester"], 1);
    }

    #[test]
    fn test_broadcast_without_sockets() {
        let hub = EventHub::new();
        assert_eq!(hub.broadcast_student_update("CSE", 1, Map::new()), 0);
    }
}
