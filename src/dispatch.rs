//! From platform events to sent SMS.
//!
//! Each cycle fetches the events newer than the last one seen, plans every
//! event into an [`AlarmTask`], and sends the planned requests one at a time.
//!
//! ```text
//! EventSource::fetch_after(last_num)
//!   -> classify            success | failure
//!   -> plan_event          Templated(requests) | Resend(request) | Operator { notice }
//!   -> deliver             sequential, `pacing` apart
//!   -> TaskStatus          Sent | Failed | Skipped
//! ```
//!
//! Individual send failures are logged and do not stop the cycle. Nothing is
//! retried here; a failed send shows up again only if the platform logs it as
//! a new event.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::api::{default_catalog, parse_with};
use crate::assemble::{SmsRequest, assemble};
use crate::event::{AlarmEvent, EventBody, classify};
use crate::{Catalog, Config, FieldMap};

/// Failure at a collaborator boundary (event source or SMS provider).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Delivers one SMS request.
pub trait SmsTransport: Send + Sync {
    fn send(&self, sign_name: &str, request: &SmsRequest) -> Result<(), TransportError>;

    /// Human-readable name for logs.
    fn channel_name(&self) -> &str {
        "sms"
    }
}

/// Supplies platform events.
pub trait EventSource: Send + Sync {
    /// Events with a sequence number above `last_num`. Returning older events
    /// too is allowed; the dispatcher filters them.
    fn fetch_after(&self, last_num: u64) -> Result<Vec<AlarmEvent>, TransportError>;
}

/// What to send for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// The alarm text matched a template; one request per field map.
    Templated(Vec<SmsRequest>),
    /// The platform failed to send; resend the original text verbatim.
    Resend(SmsRequest),
    /// The event could not be handled automatically. `notice` is `None`
    /// when no operator number is configured.
    Operator { reason: String, notice: Option<SmsRequest> },
}

impl Plan {
    pub fn requests(&self) -> &[SmsRequest] {
        match self {
            Plan::Templated(requests) => requests,
            Plan::Resend(request) => std::slice::from_ref(request),
            Plan::Operator { notice, .. } => notice.as_slice(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Sent,
    /// At least one request was not accepted by the transport.
    Failed,
    /// Nothing to send.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmTask {
    pub event_num: u64,
    pub event_time: i64,
    pub plan: Plan,
    pub status: TaskStatus,
}

impl AlarmTask {
    pub fn new(event: &AlarmEvent, plan: Plan) -> Self {
        AlarmTask { event_num: event.num, event_time: event.timestamp, plan, status: TaskStatus::Pending }
    }
}

/// Outcome of one [`Dispatcher::run_cycle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub tasks: Vec<AlarmTask>,
}

impl CycleReport {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}

/// Holds the dispatcher's in-flight flag for the duration of a cycle.
#[derive(Debug)]
pub struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    /// `None` when another cycle holds the flag.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| CycleGuard { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Plan an event against the built-in catalog.
pub fn plan_event(event: &AlarmEvent, config: &Config) -> Plan {
    plan_event_with(event, config, default_catalog())
}

pub fn plan_event_with(event: &AlarmEvent, config: &Config, catalog: &Catalog) -> Plan {
    match classify(event) {
        EventBody::Failure { body, targets } => {
            if body.trim().is_empty() || targets.is_empty() {
                return operator_plan(event, "failed SMS without text or recipients", config);
            }
            let mut params = FieldMap::new();
            params.insert("Message", body);
            Plan::Resend(SmsRequest::new(&config.resend_template, &targets, &params, config.value_cap))
        }
        EventBody::Success { body, targets } => {
            if targets.is_empty() {
                return operator_plan(event, "no recipients found", config);
            }
            match parse_with(&body, catalog) {
                Ok(parsed) => {
                    tracing::debug!(event = event.num, template = parsed.template.id, maps = parsed.fields.len(), "planned");
                    Plan::Templated(assemble(parsed.template.sms_code, &parsed.fields, &targets, config.value_cap))
                }
                Err(err) => {
                    tracing::warn!(event = event.num, error = %err, "alarm text not templated");
                    operator_plan(event, &err.to_string(), config)
                }
            }
        }
    }
}

fn operator_plan(event: &AlarmEvent, reason: &str, config: &Config) -> Plan {
    Plan::Operator { reason: reason.to_string(), notice: operator_notice(event, reason, config) }
}

/// A request telling the operator about `event`, or `None` (logged) when no
/// operator number is configured.
pub fn operator_notice(event: &AlarmEvent, reason: &str, config: &Config) -> Option<SmsRequest> {
    if !config.has_operator() {
        tracing::error!(event = event.num, reason, "no operator number configured, notice dropped");
        return None;
    }

    let targets: Vec<String> =
        config.operator_numbers.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).map(str::to_string).collect();

    let mut params = FieldMap::new();
    params.insert("EventId", event.num.to_string());
    if let Some(at) = event.occurred_at() {
        params.insert("Time", at.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    params.insert("Reason", reason.to_string());
    params.insert("Message", event.msg.clone());

    Some(SmsRequest::new(&config.operator_template, &targets, &params, config.value_cap))
}

/// Fetches, plans and sends, one cycle at a time.
pub struct Dispatcher {
    config: Config,
    catalog: Catalog,
    transport: Box<dyn SmsTransport>,
    in_flight: AtomicBool,
    last_num: AtomicU64,
}

impl Dispatcher {
    pub fn new(config: Config, transport: Box<dyn SmsTransport>) -> Self {
        Self::with_catalog(config, Catalog::default(), transport)
    }

    pub fn with_catalog(config: Config, catalog: Catalog, transport: Box<dyn SmsTransport>) -> Self {
        Self { config, catalog, transport, in_flight: AtomicBool::new(false), last_num: AtomicU64::new(0) }
    }

    /// Skip events up to and including `num`.
    pub fn resume_from(self, num: u64) -> Self {
        self.last_num.store(num, Ordering::Release);
        self
    }

    pub fn last_num(&self) -> u64 {
        self.last_num.load(Ordering::Acquire)
    }

    pub fn try_begin(&self) -> Option<CycleGuard<'_>> {
        CycleGuard::acquire(&self.in_flight)
    }

    /// Run one fetch/plan/send cycle.
    ///
    /// Returns `Ok(None)` without fetching when a cycle is already running.
    pub fn run_cycle(&self, source: &dyn EventSource) -> Result<Option<CycleReport>, TransportError> {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("previous cycle still in flight, skipping");
            return Ok(None);
        };

        let last = self.last_num();
        let mut events = source.fetch_after(last)?;
        events.retain(|e| e.num > last);
        events.sort_by_key(|e| e.num);
        tracing::debug!(last, fetched = events.len(), "fetched events");

        let mut tasks: Vec<AlarmTask> = events
            .iter()
            .map(|event| AlarmTask::new(event, plan_event_with(event, &self.config, &self.catalog)))
            .collect();

        let mut sent_any = false;
        for task in &mut tasks {
            self.deliver(task, &mut sent_any);
        }

        if let Some(newest) = events.last() {
            self.last_num.store(newest.num, Ordering::Release);
        }

        Ok(Some(CycleReport { fetched: events.len(), tasks }))
    }

    /// Send every request of `task` and record the outcome.
    pub fn deliver(&self, task: &mut AlarmTask, sent_any: &mut bool) {
        let requests = task.plan.requests();
        if requests.is_empty() {
            task.status = TaskStatus::Skipped;
            return;
        }

        let mut failed = false;
        for request in requests {
            if *sent_any {
                self.pace();
            }
            *sent_any = true;

            match self.transport.send(&self.config.sign_name, request) {
                Ok(()) => tracing::info!(
                    event = task.event_num,
                    channel = self.transport.channel_name(),
                    template = %request.template_code,
                    recipients = %request.phone_numbers,
                    truncated = request.truncated.len(),
                    "sms sent"
                ),
                Err(err) => {
                    failed = true;
                    tracing::error!(
                        event = task.event_num,
                        channel = self.transport.channel_name(),
                        template = %request.template_code,
                        error = %err,
                        "sms send failed"
                    );
                }
            }
        }

        task.status = if failed { TaskStatus::Failed } else { TaskStatus::Sent };
    }

    fn pace(&self) {
        let pacing = self.config.pacing();
        if pacing > Duration::ZERO {
            std::thread::sleep(pacing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ExtraField;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    struct MockTransport {
        sent: Arc<Mutex<Vec<SmsRequest>>>,
        reject_code: Option<&'static str>,
    }

    impl SmsTransport for MockTransport {
        fn send(&self, _sign_name: &str, request: &SmsRequest) -> Result<(), TransportError> {
            if self.reject_code == Some(request.template_code.as_str()) {
                return Err(TransportError::Rejected("mock rejection".to_string()));
            }
            self.sent.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    struct MockSource {
        events: Vec<AlarmEvent>,
    }

    impl EventSource for MockSource {
        fn fetch_after(&self, _last_num: u64) -> Result<Vec<AlarmEvent>, TransportError> {
            Ok(self.events.clone())
        }
    }

    const COMM_REPEATED: &str = "2024-03-18 09:15:02+08:00 重复消息:设备“SZ608”的通道1上有通信警报。设备描述:冷库1号探头 M1234567/COM3/1/VL-HOST01。因此，以下位置不可用:locA/zoneA(labelA)/codeA(idA), locB/zoneB(labelB)/codeB(idB)";

    fn config() -> Config {
        Config { operator_numbers: vec!["13900000000".to_string()], pacing_ms: 0, ..Config::default() }
    }

    fn success(num: u64, body: &str) -> AlarmEvent {
        AlarmEvent {
            num,
            timestamp: 1_710_724_502,
            msg: format!("SMS text: \"{body}\" sent."),
            category: "system".to_string(),
            extra_fields: vec![ExtraField { name: "Recipients".to_string(), value: "张三 13812345678".to_string() }],
        }
    }

    fn dispatcher(reject_code: Option<&'static str>) -> (Dispatcher, Arc<Mutex<Vec<SmsRequest>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport { sent: sent.clone(), reject_code };
        (Dispatcher::new(config(), Box::new(transport)), sent)
    }

    #[test]
    fn unrecognized_text_goes_to_the_operator() {
        let event = success(246397, "[246397] 重ddsad复:设备\"SZ608\"上的某种警报");
        let Plan::Operator { reason, notice: Some(notice) } = plan_event(&event, &config()) else {
            panic!("expected an operator notice");
        };
        assert!(reason.contains("no known template"));
        assert_eq!(notice.phone_numbers, "13900000000");
        assert_eq!(notice.template_code, Config::default().operator_template);
        assert_eq!(notice.params["EventId"], "246397");
        assert_eq!(notice.params["Time"], "2024-03-18 01:15:02");
    }

    #[test]
    fn missing_operator_drops_the_notice() {
        let event = success(1, "nothing recognizable");
        let plan = plan_event(&event, &Config::default());
        assert!(matches!(plan, Plan::Operator { notice: None, .. }));
        assert!(plan.requests().is_empty());
    }

    #[test]
    fn recognized_text_fans_out_into_requests() {
        let Plan::Templated(requests) = plan_event(&success(2, COMM_REPEATED), &config()) else {
            panic!("expected templated requests");
        };
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.template_code == "SMS_461930103" && r.phone_numbers == "13812345678"));
        assert_eq!(requests[0].params["LocationName"], "locA");
        assert_eq!(requests[1].params["LocationName"], "locB");
    }

    #[test]
    fn failed_sends_are_resent_verbatim() {
        let event = AlarmEvent {
            num: 3,
            timestamp: 0,
            msg: "Alarm notification failed to send sms".to_string(),
            category: "system".to_string(),
            extra_fields: vec![
                ExtraField { name: "SMS text".to_string(), value: "系统警报:x".to_string() },
                ExtraField { name: "Recipients".to_string(), value: "15900000000".to_string() },
            ],
        };
        let Plan::Resend(request) = plan_event(&event, &config()) else {
            panic!("expected a resend");
        };
        assert_eq!(request.template_code, Config::default().resend_template);
        assert_eq!(request.params["Message"], "系统警报:x");
        assert_eq!(request.phone_numbers, "15900000000");
    }

    #[test]
    fn success_without_recipients_goes_to_the_operator() {
        let mut event = success(4, COMM_REPEATED);
        event.extra_fields.clear();
        assert!(matches!(plan_event(&event, &config()), Plan::Operator { notice: Some(_), .. }));
    }

    #[test]
    fn cycle_sends_new_events_in_order_and_advances() {
        let (dispatcher, sent) = dispatcher(None);
        let source = MockSource {
            events: vec![
                success(11, "[11] 未知格式"),
                success(10, COMM_REPEATED),
                success(9, "系统警报:旧 日期:2024-03-18 09:15:02+08:00 详细信息:"),
            ],
        };
        let dispatcher = dispatcher.resume_from(9);

        let report = dispatcher.run_cycle(&source).unwrap().unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.tasks[0].event_num, 10);
        assert_eq!(report.count(TaskStatus::Sent), 2);
        assert_eq!(dispatcher.last_num(), 11);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].template_code, Config::default().operator_template);

        // everything already seen
        let again = dispatcher.run_cycle(&source).unwrap().unwrap();
        assert_eq!(again.fetched, 0);
    }

    #[test]
    fn transport_failure_marks_the_task_and_continues() {
        let (dispatcher, sent) = dispatcher(Some("SMS_461930103"));
        let source = MockSource { events: vec![success(1, COMM_REPEATED), success(2, "unknown")] };

        let report = dispatcher.run_cycle(&source).unwrap().unwrap();
        assert_eq!(report.tasks[0].status, TaskStatus::Failed);
        assert_eq!(report.tasks[1].status, TaskStatus::Sent);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    struct ClockTransport {
        sent_at: Arc<Mutex<Vec<Instant>>>,
    }

    impl SmsTransport for ClockTransport {
        fn send(&self, _sign_name: &str, _request: &SmsRequest) -> Result<(), TransportError> {
            self.sent_at.lock().unwrap().push(Instant::now());
            Ok(())
        }
    }

    #[test]
    fn consecutive_sends_are_paced_but_the_first_is_not() {
        let sent_at = Arc::new(Mutex::new(Vec::new()));
        let config = Config { pacing_ms: 40, ..config() };
        let pacing = config.pacing();
        let dispatcher = Dispatcher::new(config, Box::new(ClockTransport { sent_at: sent_at.clone() }));
        let source = MockSource { events: vec![success(1, COMM_REPEATED), success(2, "unknown")] };

        let started = Instant::now();
        let report = dispatcher.run_cycle(&source).unwrap().unwrap();
        assert_eq!(report.count(TaskStatus::Sent), 2);

        let sent_at = sent_at.lock().unwrap();
        assert_eq!(sent_at.len(), 3);
        assert!(sent_at[0] - started < pacing, "first send waited {:?}", sent_at[0] - started);
        for pair in sent_at.windows(2) {
            assert!(pair[1] - pair[0] >= pacing, "sends only {:?} apart", pair[1] - pair[0]);
        }
    }

    #[test]
    fn overlapping_cycles_are_refused() {
        let (dispatcher, sent) = dispatcher(None);
        let source = MockSource { events: vec![success(1, COMM_REPEATED)] };

        let guard = dispatcher.try_begin().unwrap();
        assert_eq!(dispatcher.run_cycle(&source).unwrap(), None);
        assert!(sent.lock().unwrap().is_empty());

        drop(guard);
        assert!(dispatcher.run_cycle(&source).unwrap().is_some());
        assert_eq!(sent.lock().unwrap().len(), 2);
    }
}
