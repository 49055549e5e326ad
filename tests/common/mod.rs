use sqlite_gateway::{EventSink, GatewayEvent};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Event sink that records everything it receives, with a polling helper
/// for events produced on other threads.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<GatewayEvent>>,
}

impl EventSink for CollectingSink {
    fn dispatch(&self, event: GatewayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl CollectingSink {
    pub fn snapshot(&self) -> Vec<GatewayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_matching(&self, predicate: impl Fn(&GatewayEvent) -> bool) -> usize {
        self.snapshot().iter().filter(|e| predicate(e)).count()
    }

    /// Poll until at least one recorded event matches, or the timeout runs
    /// out.
    pub fn wait_for(&self, predicate: impl Fn(&GatewayEvent) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.snapshot().iter().any(&predicate) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}
