use crate::core::{encode_update, SyncError, Todo, WireMessage};
use crate::render::{project, DateFormatter, Renderer, TodoRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Client-side state of one todo sync session, free of any I/O.
///
/// The session owns the todo list and the renderer. The async driver feeds it
/// connection events and inbound frames and ships whatever outbound frames it
/// returns.
pub struct TodoSession<R: Renderer> {
    todos: Vec<Todo>,
    state: ConnectionState,
    attempts: u64,
    renderer: R,
    dates: DateFormatter,
}

impl<R: Renderer> TodoSession<R> {
    pub fn new(renderer: R, dates: DateFormatter) -> Self {
        Self {
            todos: Vec::new(),
            state: ConnectionState::Connecting,
            attempts: 0,
            renderer,
            dates,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection attempts started so far, the first one included.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub fn rows(&self) -> Vec<TodoRow> {
        project(&self.todos, &self.dates)
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
        self.attempts += 1;
    }

    pub fn opened(&mut self) {
        self.state = ConnectionState::Open;
    }

    pub fn closed(&mut self) {
        self.state = ConnectionState::Closed;
    }

    /// Applies one inbound text frame.
    ///
    /// Returns the size of the new list when the frame was a snapshot, `None`
    /// when its type is not one we act on. A malformed frame leaves the list
    /// untouched and is reported as an error.
    pub fn apply_frame(&mut self, text: &str) -> Result<Option<usize>, SyncError> {
        let Some(snapshot) = WireMessage::decode(text)?.into_snapshot() else {
            return Ok(None);
        };
        self.todos = snapshot;
        self.render();
        Ok(Some(self.todos.len()))
    }

    /// Flips `completed` on the todo with this id and returns the `update`
    /// frame carrying the whole list. Unknown ids change nothing.
    pub fn toggle(&mut self, id: i64) -> Result<Option<String>, SyncError> {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        todo.completed = !todo.completed;
        self.render();
        encode_update(&self.todos).map(Some)
    }

    fn render(&mut self) {
        let rows = project(&self.todos, &self.dates);
        self.renderer.render(&rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Zone;

    #[derive(Default)]
    struct Frames(Vec<Vec<TodoRow>>);

    impl Renderer for Frames {
        fn render(&mut self, rows: &[TodoRow]) {
            self.0.push(rows.to_vec());
        }
    }

    fn session() -> TodoSession<Frames> {
        let dates = DateFormatter::for_locale("en_US").unwrap().with_zone(Zone::Utc);
        TodoSession::new(Frames::default(), dates)
    }

    const ONE: &str = r#"{"type":"init","data":[{"id":1,"text":"A","completed":false,"date":"2024-03-15T12:00:00Z"}]}"#;
    const TWO: &str = r#"{"type":"init","data":[
        {"id":1,"text":"A","completed":false,"date":"2024-03-15T12:00:00Z"},
        {"id":2,"text":"B","completed":true,"date":"2024-03-16T12:00:00Z"}]}"#;

    #[test]
    fn starts_empty_and_connecting() {
        let session = session();
        assert!(session.todos().is_empty());
        assert_eq!(session.state(), ConnectionState::Connecting);
        assert_eq!(session.attempts(), 0);
        assert!(session.renderer().0.is_empty());
    }

    #[test]
    fn snapshot_renders_one_row_per_todo() {
        let mut session = session();
        assert_eq!(session.apply_frame(ONE).unwrap(), Some(1));
        let frames = &session.renderer().0;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0], vec![TodoRow {
            id: 1,
            checked: false,
            text: "A".into(),
            date: "03/15/2024".into(),
        }]);
    }

    #[test]
    fn update_replaces_the_whole_list() {
        let mut session = session();
        session.apply_frame(TWO).unwrap();
        let update = r#"{"type":"update","data":[{"id":9,"text":"Z","completed":false,"date":0}]}"#;
        assert_eq!(session.apply_frame(update).unwrap(), Some(1));
        let ids: Vec<i64> = session.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![9]);
        let last = session.renderer().0.last().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, 9);
    }

    #[test]
    fn odd_dates_do_not_cost_the_snapshot() {
        let mut session = session();
        session.apply_frame(ONE).unwrap();
        let update = r#"{"type":"update","data":[
            {"id":4,"text":"Float","completed":false,"date":1710504000000.0},
            {"id":5,"text":"Null","completed":false,"date":null},
            {"id":6,"text":"Missing","completed":true}]}"#;
        assert_eq!(session.apply_frame(update).unwrap(), Some(3));
        let last = session.renderer().0.last().unwrap();
        assert_eq!(last.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(last[0].date, "03/15/2024");
        assert_eq!(last[1].date, crate::render::INVALID_DATE);
        assert_eq!(last[2].date, crate::render::INVALID_DATE);
    }

    #[test]
    fn unknown_type_changes_nothing() {
        let mut session = session();
        session.apply_frame(ONE).unwrap();
        assert_eq!(session.apply_frame(r#"{"type":"ping"}"#).unwrap(), None);
        assert_eq!(session.todos().len(), 1);
        assert_eq!(session.renderer().0.len(), 1);
    }

    #[test]
    fn malformed_frame_keeps_prior_list() {
        let mut session = session();
        session.apply_frame(ONE).unwrap();
        let err = session.apply_frame("{not json").unwrap_err();
        assert!(matches!(err, SyncError::Deserialization(_)));
        assert_eq!(session.todos().len(), 1);
        assert_eq!(session.renderer().0.len(), 1);
    }

    #[test]
    fn toggle_twice_restores_and_sends_the_full_list_each_time() {
        let mut session = session();
        session.apply_frame(TWO).unwrap();

        let first: serde_json::Value =
            serde_json::from_str(&session.toggle(1).unwrap().unwrap()).unwrap();
        assert_eq!(first["type"], "update");
        assert_eq!(first["data"].as_array().unwrap().len(), 2);
        assert_eq!(first["data"][0]["completed"], true);
        assert_eq!(first["data"][1]["completed"], true);

        let second: serde_json::Value =
            serde_json::from_str(&session.toggle(1).unwrap().unwrap()).unwrap();
        assert_eq!(second["data"][0]["completed"], false);
        assert!(!session.todos()[0].completed);
        assert_eq!(session.renderer().0.len(), 3);
    }

    #[test]
    fn toggle_unknown_id_is_a_no_op() {
        let mut session = session();
        session.apply_frame(ONE).unwrap();
        let before = session.todos().to_vec();
        assert_eq!(session.toggle(999).unwrap(), None);
        assert_eq!(session.todos(), before.as_slice());
        assert_eq!(session.renderer().0.len(), 1);
    }

    #[test]
    fn toggle_keeps_order_and_other_items() {
        let mut session = session();
        session.apply_frame(TWO).unwrap();
        session.toggle(2).unwrap();
        let ids: Vec<i64> = session.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(!session.todos()[0].completed);
        assert!(!session.todos()[1].completed);
    }

    #[test]
    fn rows_reflect_the_current_list_without_rendering() {
        let mut session = session();
        session.apply_frame(TWO).unwrap();
        let rows = session.rows();
        assert_eq!(rows.iter().map(|r| (r.id, r.checked)).collect::<Vec<_>>(), vec![(1, false), (2, true)]);
        assert_eq!(session.renderer().0.len(), 1);
    }

    #[test]
    fn connection_states_cycle_and_count_attempts() {
        let mut session = session();
        for attempt in 1..=3 {
            session.begin_connect();
            assert_eq!(session.state(), ConnectionState::Connecting);
            assert_eq!(session.attempts(), attempt);
            session.opened();
            assert_eq!(session.state(), ConnectionState::Open);
            session.closed();
            assert_eq!(session.state(), ConnectionState::Closed);
        }
    }
}
