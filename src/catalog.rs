//! The fixed table of alarm kinds.
//!
//! Entries are tried in declaration order and the first one whose markers all
//! occur (in order) wins. Several kinds share vocabulary: a repeated alarm
//! carries every marker of its plain counterpart plus one more, so the plain
//! template would happily match repeated text too. Each repeated entry
//! therefore declares which entry it `shadows`, and [`Catalog::precedence_violations`]
//! checks that the declaration is honored by the ordering.
//!
//! Message shapes (after normalization), `<ts>` being
//! `YYYY-MM-DD HH:MM:SS+HH:MM`:
//!
//! ```text
//! threshold      日期:<ts> 位置/区域:<name>/<zone> 阈值条件:<cond> 阈值警报:<n>°C-<ts>
//! device comm    <ts> 设备"<dev>"的<channel>上有通信警报.设备描述:<desc> <serial>/<addr>/<host>.
//!                因此,以下位置不可用:<name>/<zone>(<label>)/<code>, ...
//! device config  <ts> 设备"<dev>"上的配置警报.设备描述:<desc> <serial>/<addr>/<host>.
//!                因此,以下位置可能受影响:<name>/<zone>(<label>)/<ts>, ...
//! calibration    <ts> 设备"<dev>"上的校准警报.设备描述:<desc> <serial>/<addr>/<host>.校准到期日期:<date>
//! host comm      <ts> 主机"<host>"上有通信警报.主机描述:<desc>.因此,以下设备不可用:<dev>, ...
//! system         系统警报:<name> 日期:<ts> 详细信息:<detail>
//! ```
//!
//! Repeated variants prefix `重复消息:` to the leading marker (threshold uses a
//! leading `阈值重复警报:<name>` instead).

use crate::{Extractor, TemplateDefinition};

/// Ordered list of template definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<TemplateDefinition>,
}

/// A `shadows` declaration the catalog order does not honor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceViolation {
    pub template: &'static str,
    pub shadows: &'static str,
    pub reason: &'static str,
}

impl Catalog {
    pub fn new(templates: Vec<TemplateDefinition>) -> Self {
        Catalog { templates }
    }

    pub fn templates(&self) -> &[TemplateDefinition] {
        &self.templates
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TemplateDefinition> {
        self.templates.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.templates.iter().position(|t| t.id == id)
    }

    /// Check every `shadows` declaration against the catalog.
    ///
    /// A declaration holds when the shadowed entry exists, comes later in the
    /// catalog, and its markers are covered by the shadowing entry's markers
    /// in order (each shadowed marker is a substring of a strictly later
    /// shadowing marker than the previous one). The last condition is what
    /// makes the shadowing entry's text satisfy the shadowed entry too.
    pub fn precedence_violations(&self) -> Vec<PrecedenceViolation> {
        let mut violations = Vec::new();

        for (idx, template) in self.templates.iter().enumerate() {
            let Some(shadows) = template.shadows else {
                continue;
            };
            let violation = |reason| PrecedenceViolation { template: template.id, shadows, reason };

            let Some(general_idx) = self.position(shadows) else {
                violations.push(violation("shadowed template is not in the catalog"));
                continue;
            };
            if general_idx <= idx {
                violations.push(violation("shadowed template is declared first"));
                continue;
            }
            if !markers_cover(template.markers, self.templates[general_idx].markers) {
                violations.push(violation("markers do not cover the shadowed template's markers"));
            }
        }

        violations
    }
}

impl Default for Catalog {
    fn default() -> Self {
        builtin()
    }
}

/// Whether each of `general` occurs inside `specific`, in order.
fn markers_cover(specific: &[&str], general: &[&str]) -> bool {
    let mut rest = specific.iter();
    general.iter().all(|needle| rest.by_ref().any(|m| m.contains(*needle)))
}

/// The built-in viewLinc alarm catalog.
pub fn builtin() -> Catalog {
    Catalog::new(vec![
        template! {
            id: "threshold_repeated",
            sms_code: "SMS_461930101",
            markers: ["阈值重复警报:", "日期:", "位置/区域:", "阈值条件:", "阈值警报:"],
            shadows: "threshold",
            extractor: Extractor::ThresholdRepeated,
        },
        template! {
            id: "threshold",
            sms_code: "SMS_461930102",
            markers: ["日期:", "位置/区域:", "阈值条件:", "阈值警报:"],
            extractor: Extractor::Threshold,
        },
        template! {
            id: "device_comm_repeated",
            sms_code: "SMS_461930103",
            markers: ["重复消息:设备", "的", "上有通信警报.设备描述:", "因此,以下位置不可用:"],
            shadows: "device_comm",
            extractor: Extractor::DeviceCommRepeated,
        },
        template! {
            id: "device_comm",
            sms_code: "SMS_461930104",
            markers: ["设备", "的", "上有通信警报.设备描述:", "因此,以下位置不可用:"],
            extractor: Extractor::DeviceComm,
        },
        template! {
            id: "device_config_repeated",
            sms_code: "SMS_461930105",
            markers: ["重复消息:设备", "上的配置警报.设备描述:", "因此,以下位置可能受影响:"],
            shadows: "device_config",
            extractor: Extractor::DeviceConfigRepeated,
        },
        template! {
            id: "device_config",
            sms_code: "SMS_461930106",
            markers: ["设备", "上的配置警报.设备描述:", "因此,以下位置可能受影响:"],
            extractor: Extractor::DeviceConfig,
        },
        template! {
            id: "calibration_repeated",
            sms_code: "SMS_461930107",
            markers: ["重复消息:设备", "上的校准警报.设备描述:", "校准到期日期:"],
            shadows: "calibration",
            extractor: Extractor::CalibrationRepeated,
        },
        template! {
            id: "calibration",
            sms_code: "SMS_461930108",
            markers: ["设备", "上的校准警报.设备描述:", "校准到期日期:"],
            extractor: Extractor::Calibration,
        },
        template! {
            id: "host_comm_repeated",
            sms_code: "SMS_461930109",
            markers: ["重复消息:主机", "上有通信警报.主机描述:", "因此,以下设备不可用:"],
            shadows: "host_comm",
            extractor: Extractor::HostCommRepeated,
        },
        template! {
            id: "host_comm",
            sms_code: "SMS_461930110",
            markers: ["主机", "上有通信警报.主机描述:", "因此,以下设备不可用:"],
            extractor: Extractor::HostComm,
        },
        template! {
            id: "system_repeated",
            sms_code: "SMS_461930111",
            markers: ["重复消息:系统警报:", "日期:", "详细信息:"],
            shadows: "system",
            extractor: Extractor::SystemRepeated,
        },
        template! {
            id: "system",
            sms_code: "SMS_461930112",
            markers: ["系统警报:", "日期:", "详细信息:"],
            extractor: Extractor::System,
        },
    ])
}
