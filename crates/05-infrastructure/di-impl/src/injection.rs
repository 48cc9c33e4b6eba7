//! 注入点限定符

use crate::factory_registry::QualifierFactoryRegistry;
use crate::runtime_qualifier::{self, RUNTIME_QUALIFIED};
use di_abstractions::{QualifierRef, Qualifiers};
use infrastructure_common::{Argument, QualifierResult, VALUE_MEMBER};

/// 按名称限定的注解
pub const NAMED: &str = "Named";

/// 无约束的注解
pub const ANY: &str = "Any";

/// 从注入点声明的注解计算限定符
///
/// `Named` 没有值时使用参数名称，提供者参数的默认名称是目标类型的名称。
/// 没有可识别的限定注解时返回 `None`。
pub fn injection_point_qualifier(
    argument: &Argument,
    registry: &QualifierFactoryRegistry,
) -> QualifierResult<Option<QualifierRef>> {
    let metadata = argument.annotation_metadata();
    if metadata.has_annotation(RUNTIME_QUALIFIED) {
        return runtime_qualifier::create_with(argument, registry).map(Some);
    }
    if let Some(named) = metadata.annotation(NAMED) {
        let name = named.string_value(VALUE_MEMBER).unwrap_or(argument.name());
        return Ok(Some(Qualifiers::by_name(name)));
    }
    if metadata.has_annotation(ANY) {
        return Ok(Some(Qualifiers::any()));
    }
    Ok(None)
}
