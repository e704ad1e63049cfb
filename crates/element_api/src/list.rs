use crate::api::ElementApi;
use core_types::UniqueId;
use serde::Deserialize;

pub type ComponentAtIndexFn<S> = Box<dyn FnMut(&mut ElementApi<S>, UniqueId, usize)>;
pub type EnqueueComponentFn<S> = Box<dyn FnMut(&mut ElementApi<S>, UniqueId, usize)>;

/// Callbacks a list element uses to ask for items and hand back removed ones.
pub struct ListCallbacks<S> {
    pub component_at_index: ComponentAtIndexFn<S>,
    pub enqueue_component: EnqueueComponentFn<S>,
}

impl<S> ListCallbacks<S> {
    pub fn new(
        component_at_index: impl FnMut(&mut ElementApi<S>, UniqueId, usize) + 'static,
        enqueue_component: impl FnMut(&mut ElementApi<S>, UniqueId, usize) + 'static,
    ) -> Self {
        Self {
            component_at_index: Box::new(component_at_index),
            enqueue_component: Box::new(enqueue_component),
        }
    }
}

/// Value of the `update-list-info` attribute on a list element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListInfo {
    #[serde(default)]
    pub insert_action: Vec<ListAction>,
    #[serde(default)]
    pub remove_action: Vec<ListAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ListAction {
    pub position: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_actions_default_to_empty() {
        let info: UpdateListInfo =
            serde_json::from_str(r#"{"insertAction":[{"position":2}]}"#).unwrap();
        assert_eq!(info.insert_action, vec![ListAction { position: 2 }]);
        assert!(info.remove_action.is_empty());
    }
}
