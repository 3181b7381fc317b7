#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a catalog entry.
///
/// ```ignore
/// template! {
///     id: "system",
///     sms_code: "SMS_461930112",
///     markers: ["系统警报:", "日期:", "详细信息:"],
///     extractor: Extractor::System,
/// }
/// ```
///
/// `shadows` names the general entry that a repeated variant must precede.
#[macro_export]
macro_rules! template {
    (
        id: $id:expr,
        sms_code: $code:expr,
        markers: [ $($marker:expr),+ $(,)? ]
        $(, shadows: $shadows:expr)?
        , extractor: $extractor:expr
        $(,)?
    ) => {{
        $crate::TemplateDefinition {
            id: $id,
            sms_code: $code,
            markers: &[ $($marker),+ ],
            shadows: { None::<&'static str> $(.or(Some($shadows)))? },
            extractor: $extractor,
        }
    }};
}
