use alarmsms::{AlarmError, ParseDetails, ParseVerbose, SmsRequest};

/// What a piece of report text is, mapped to one SGR sequence.
#[derive(Clone, Copy)]
enum Role {
    Banner,
    Rule,
    Index,
    Marker,
    Field,
    Template,
    Recipient,
    Matched,
    Muted,
    Lossy,
    Failure,
}

impl Role {
    fn sgr(self) -> &'static str {
        match self {
            Role::Banner => "1;36",
            Role::Rule | Role::Index => "90",
            Role::Marker | Role::Lossy => "33",
            Role::Field => "34",
            Role::Template => "1;32",
            Role::Recipient => "36",
            Role::Matched => "32",
            Role::Muted => "2",
            Role::Failure => "1;31",
        }
    }
}

struct Style {
    color: bool,
}

impl Style {
    fn new(color: bool) -> Self {
        Self { color }
    }

    fn tint(&self, role: Role, text: impl AsRef<str>) -> String {
        if self.color { format!("\x1b[{}m{}\x1b[0m", role.sgr(), text.as_ref()) } else { text.as_ref().to_string() }
    }

    fn section(&self, title: &str) {
        println!("\n{}", self.tint(Role::Rule, format!("━━━ {title} ━━━")));
    }

    fn index(&self, idx: usize) -> String {
        self.tint(Role::Index, format!("[{idx}]"))
    }

    /// `✓`/`✗` followed by `text`, green when the template matched.
    fn verdict(&self, matched: bool, text: &str) -> String {
        if matched { self.tint(Role::Matched, format!("✓ {text}")) } else { self.tint(Role::Muted, format!("✗ {text}")) }
    }
}

pub fn print_run(input: &str, run: &ParseVerbose, requests: &[SmsRequest], color: bool) {
    let style = Style::new(color);
    let details = &run.details;
    println!("\n{}", style.tint(Role::Banner, format!("⚙  Alarm: \"{}\"", input.trim())));

    style.section("Normalized");
    println!("  {}", details.normalized);
    if !details.rewrites.is_empty() {
        println!("  {}", style.tint(Role::Muted, format!("rewrites: {:?}", details.rewrites)));
    }

    style.section("Candidates");
    print_candidates(details, &style);

    match &run.result {
        Ok(parsed) => {
            style.section(&format!("Segments ({})", parsed.template.id));
            print_segments(details, parsed.template.markers, &style);

            style.section(if parsed.fan_out { "Fields (one map per location)" } else { "Fields" });
            for (idx, map) in parsed.fields.iter().enumerate() {
                println!("  {}", style.index(idx));
                for (field, value) in map {
                    let value = if value.is_empty() { style.tint(Role::Muted, "(empty)") } else { value.clone() };
                    println!("      {} {}", style.tint(Role::Field, format!("{field}:")), value);
                }
            }

            style.section(&format!("Requests → {}", parsed.template.sms_code));
            print_requests(requests, &style);
        }
        Err(err) => {
            style.section("Rejected");
            println!("  {}", style.tint(Role::Failure, err.to_string()));
            match err {
                AlarmError::NoMatch => {
                    println!("\n{}", style.tint(Role::Marker, "Possible reasons:"));
                    println!("  • A marker is misspelled or uses punctuation the normalizer does not map");
                    println!("  • The alarm kind is not in the catalog");
                }
                AlarmError::MalformedAlarmText { .. } => {
                    println!("\n{}", style.tint(Role::Marker, "The markers matched but a segment did not split."));
                }
            }
            println!("\n{}", style.tint(Role::Muted, "  Tip: Set RUST_LOG=alarmsms=debug to trace marker search"));
        }
    }

    style.section("Timing");
    println!(
        "  Total: {}  │  Normalize: {:?}  │  Match: {:?}  │  Split: {:?}  │  Extract: {:?}",
        style.tint(Role::Matched, format!("{:?}", details.total)),
        details.normalize,
        details.matching,
        details.split,
        details.extract,
    );
    println!();
}

fn print_candidates(details: &ParseDetails, style: &Style) {
    for candidate in &details.candidates {
        let progress = format!("{}/{} markers", candidate.markers_found, candidate.markers);
        println!(
            "  {} {}",
            style.tint(Role::Field, format!("{:<24}", candidate.template)),
            style.verdict(candidate.matched, &progress)
        );
    }
}

fn print_segments(details: &ParseDetails, markers: &[&str], style: &Style) {
    for (idx, segment) in details.segments.iter().enumerate() {
        println!("  {} {:?}", style.index(idx), segment);
        if let (Some(marker), Some(at)) = (markers.get(idx), details.positions.get(idx)) {
            println!("      {}", style.tint(Role::Marker, format!("{marker} @{at}")));
        }
    }
}

fn print_requests(requests: &[SmsRequest], style: &Style) {
    if requests.is_empty() {
        println!("{}", style.tint(Role::Muted, "  No recipients given (use --targets)"));
        return;
    }

    for (idx, request) in requests.iter().enumerate() {
        let params = request.template_param_json().unwrap_or_else(|err| format!("<unserializable: {err}>"));
        println!(
            "  {} {} → {}",
            style.index(idx),
            style.tint(Role::Template, &request.template_code),
            style.tint(Role::Recipient, &request.phone_numbers),
        );
        println!("      {}", params);
        for loss in &request.truncated {
            println!("      {}", style.tint(Role::Lossy, format!("{} cut from {} chars", loss.field, loss.original_len)));
        }
    }
}
