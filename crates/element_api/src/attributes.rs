//! Attribute names the element API stamps on elements.

pub const UNIQUE_ID_ATTRIBUTE: &str = "x-uid";
pub const TAG_ATTRIBUTE: &str = "x-tag";
pub const CSS_ID_ATTRIBUTE: &str = "x-css-id";
pub const COMPONENT_ID_ATTRIBUTE: &str = "x-comp-id";
pub const PARENT_COMPONENT_UNIQUE_ID_ATTRIBUTE: &str = "x-parent-comp-uid";
pub const ENTRY_NAME_ATTRIBUTE: &str = "x-e-name";
pub const TEMPLATE_MARKER_ATTRIBUTE: &str = "x-template";
pub const PART_ID_ATTRIBUTE: &str = "x-part";
pub const DISPOSED_ATTRIBUTE: &str = "x-disposed";
pub const DEFAULT_DISPLAY_LINEAR_ATTRIBUTE: &str = "x-default-display-linear";
pub const DEFAULT_OVERFLOW_VISIBLE_ATTRIBUTE: &str = "x-default-overflow-visible";
pub const TIMING_FLAG_ATTRIBUTE: &str = "__timing_flag";
pub const UPDATE_LIST_INFO_ATTRIBUTE: &str = "update-list-info";
pub const EXPOSURE_ID_ATTRIBUTE: &str = "exposure-id";

const EXPOSURE_RELATED: &[&str] = &[
    EXPOSURE_ID_ATTRIBUTE,
    "exposure-area",
    "exposure-screen-margin-top",
    "exposure-screen-margin-right",
    "exposure-screen-margin-bottom",
    "exposure-screen-margin-left",
    "exposure-ui-margin-top",
    "exposure-ui-margin-right",
    "exposure-ui-margin-bottom",
    "exposure-ui-margin-left",
];

pub fn is_exposure_related(key: &str) -> bool {
    EXPOSURE_RELATED.contains(&key)
}
