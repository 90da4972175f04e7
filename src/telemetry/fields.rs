/// The bot-detection record schema
///
/// Column order of the bot-detections file. Names are dotted paths into the
/// telemetry payload the browser posts.

/// Every column of a bot-detection record, in file order
pub const BOT_FIELDS: &[&str] = &[
    "isBot",
    "botKind",
    "detectedRules",
    "browserDetails.userAgent",
    "browserDetails.platform",
    "browserDetails.language",
    "browserDetails.cookiesEnabled",
    "browserDetails.doNotTrack",
    "browserDetails.screenResolution",
    "browserDetails.colorDepth",
    "browserDetails.plugins",
    "browserDetails.timezone",
    "browserDetails.webdriver",
    "browserDetails.languages",
    "browserDetails.productSub",
    "browserDetails.maxTouchPoints",
    "browserDetails.process",
    "browserDetails.android",
    "browserDetails.browserKind",
    "browserDetails.browserEngineKind",
    "browserDetails.mimeTypesConsistent",
    "browserDetails.evalLength",
    "browserDetails.webGL.vendor",
    "browserDetails.webGL.renderer",
    "browserDetails.windowExternal.present",
    "browserDetails.windowExternal.properties",
    "detectionTime",
    "detectorsResults.appVersion.bot",
    "detectorsResults.name.bot",
    "detectorsResults.rules.bot",
    "detectorsResults.distinctiveProperties.bot",
    "detectorsResults.documentElementKeys.bot",
    "detectorsResults.errorTrace.bot",
    "detectorsResults.evalLength.bot",
    "detectorsResults.functionBind.bot",
    "detectorsResults.languageInconsistency.bot",
    "detectorsResults.mimeTypesConsistence.bot",
    "detectorsResults.notificationPermission.bot",
    "detectorsResults.pluginsArray.bot",
    "detectorsResults.pluginsInconsistency.bot",
    "detectorsResults.process.bot",
    "detectorsResults.productSub.bot",
    "detectorsResults.rtt.bot",
    "detectorsResults.userAgent.bot",
    "detectorsResults.webDriver.bot",
    "detectorsResults.webGL.bot",
    "detectorsResults.windowExternal.bot",
    "detectorsResults.windowSize.bot",
    "appVersion.value",
    "appVersion.state",
    "userAgent.value",
    "userAgent.state",
    "webDriver.value",
    "webDriver.state",
    "languages.value",
    "languages.state",
    "productSub.value",
    "productSub.state",
    "pluginsArray.value",
    "pluginsArray.state",
    "pluginsLength.value",
    "pluginsLength.state",
    "windowSize.value.outerWidth",
    "windowSize.value.outerHeight",
    "windowSize.value.innerWidth",
    "windowSize.value.innerHeight",
    "windowSize.state",
    "documentFocus.value",
    "documentFocus.state",
    "rtt.value",
    "rtt.state",
    "errorTrace.value",
    "errorTrace.state",
    "documentElementKeys.value",
    "documentElementKeys.state",
    "functionBind.value",
    "functionBind.state",
    "distinctiveProps.value.awesomium",
    "distinctiveProps.value.cef",
    "distinctiveProps.value.phantom",
    "distinctiveProps.value.selenium",
    "distinctiveProps.value.webdriver",
    "distinctiveProps.value.domAutomation",
    "distinctiveProps.state",
    "notificationPermissions.value",
    "notificationPermissions.state",
];

/// Name of the field that is normalized into access-log time format
pub const DETECTION_TIME: &str = "detectionTime";

/// Header row for a freshly created bot-detections file
pub fn header() -> Vec<String> {
    BOT_FIELDS.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_schema_shape() {
        assert_eq!(BOT_FIELDS.len(), 86);
        assert_eq!(BOT_FIELDS[0], "isBot");
        assert_eq!(BOT_FIELDS[BOT_FIELDS.len() - 1], "notificationPermissions.state");
        assert!(BOT_FIELDS.contains(&DETECTION_TIME));
    }

    #[test]
    fn test_no_duplicate_columns() {
        let unique: HashSet<_> = BOT_FIELDS.iter().collect();
        assert_eq!(unique.len(), BOT_FIELDS.len());
    }

    #[test]
    fn test_header_matches_schema() {
        let header = header();
        assert_eq!(header.len(), BOT_FIELDS.len());
        assert_eq!(header[3], "browserDetails.userAgent");
    }
}
