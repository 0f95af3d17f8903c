//! Flat list converters for variables and hostnames.

use crate::emitter::Emitter;
use crate::types::Mapping;
use super::{ConvertError, UnitConverter};

/// Variable fields carried into the template.
pub const VARIABLE_KEYS: &[&str] = &["name", "value", "description", "hidden", "sensitive"];

/// Hostname fields carried into the template.
pub const HOSTNAME_KEYS: &[&str] = &["cnameType", "cnameFrom", "cnameTo", "certProvisioningType"];

/// Write `[ {...}, ... ]` keeping, per mapping, the known keys it has.
/// Keys appear in `keys` order; mappings in source order.
fn write_mapping_list(emitter: &mut Emitter, mappings: &[Mapping], keys: &[&str]) {
    emitter.writeln("[");
    for mapping in mappings {
        emitter.writeln("{");
        for key in keys {
            if let Some(value) = mapping.get(*key) {
                emitter.write_field(key, value);
            }
        }
        emitter.writeln("},");
    }
    emitter.write("]");
}

/// Renders a rule's user variables.
pub struct VariablesConverter<'a> {
    variables: &'a [Mapping],
}

impl<'a> VariablesConverter<'a> {
    /// Create a converter over `variables`.
    pub fn new(variables: &'a [Mapping]) -> Self {
        Self { variables }
    }
}

impl UnitConverter for VariablesConverter<'_> {
    fn convert(&self, emitter: &mut Emitter) -> Result<(), ConvertError> {
        write_mapping_list(emitter, self.variables, VARIABLE_KEYS);
        emitter.blank_line();
        Ok(())
    }
}

/// Renders a property's hostname list.
pub struct HostnamesConverter<'a> {
    hostnames: &'a [Mapping],
}

impl<'a> HostnamesConverter<'a> {
    /// Create a converter over `hostnames`.
    pub fn new(hostnames: &'a [Mapping]) -> Self {
        Self { hostnames }
    }
}

impl UnitConverter for HostnamesConverter<'_> {
    fn convert(&self, emitter: &mut Emitter) -> Result<(), ConvertError> {
        write_mapping_list(emitter, self.hostnames, HOSTNAME_KEYS);
        emitter.blank_line();
        Ok(())
    }
}
