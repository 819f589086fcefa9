use crate::{
    export::{EXPORT_ALL, EXPORT_PRIVATE},
    Checker,
};
use mesh_validator_core::{Check, HasExportTo, Namespaces};

const NAMESPACE_NOT_FOUND: &str = "generic.exportto.namespacenotfound";

/// Reports export directives that target namespaces that do not exist.
pub(crate) struct ExportToNamespaceChecker<'a, T> {
    pub object: &'a T,
    pub namespaces: &'a Namespaces,
}

impl<T: HasExportTo> Checker for ExportToNamespaceChecker<'_, T> {
    fn check(&self) -> Vec<Check> {
        self.object
            .export_to()
            .iter()
            .enumerate()
            .filter(|(_, ns)| {
                let ns = ns.as_str();
                ns != EXPORT_PRIVATE && ns != EXPORT_ALL && !self.namespaces.contains(ns)
            })
            .map(|(idx, _)| Check::error(NAMESPACE_NOT_FOUND, format!("spec/exportTo[{idx}]")))
            .collect()
    }
}
