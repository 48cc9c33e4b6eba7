//! 限定符工厂注册表
//!
//! 以稳定的引用名称登记工厂声明，并按以下顺序把注解中的类引用解析为工厂：
//! 引用自带的实例、登记的实例、可无参构造的类型、需要适配的可调用对象。

use dashmap::DashMap;
use di_abstractions::{
    CallableConstructor, MetadataCallable, QualifierFactory, QualifierFactoryConstructor,
    QualifierFactoryDeclaration, QualifierFactoryRef, QualifierRef,
};
use infrastructure_common::{AnnotationMetadata, ClassValue, QualifierError, QualifierResult};
use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 全局限定符工厂注册表
static GLOBAL_QUALIFIER_FACTORIES: Lazy<Arc<QualifierFactoryRegistry>> =
    Lazy::new(|| Arc::new(QualifierFactoryRegistry::new()));

/// 限定符工厂注册表
pub struct QualifierFactoryRegistry {
    declarations: DashMap<String, QualifierFactoryDeclaration>,
    resolved: DashMap<String, QualifierFactoryRef>,
    cache_enabled: bool,
}

impl QualifierFactoryRegistry {
    /// 创建启用缓存的注册表
    pub fn new() -> Self {
        Self::with_cache(true)
    }

    /// 创建注册表，`cache_enabled` 决定构造出的工厂是否按引用复用
    pub fn with_cache(cache_enabled: bool) -> Self {
        Self {
            declarations: DashMap::new(),
            resolved: DashMap::new(),
            cache_enabled,
        }
    }

    /// 进程级注册表
    pub fn global() -> Arc<QualifierFactoryRegistry> {
        GLOBAL_QUALIFIER_FACTORIES.clone()
    }

    /// 登记现成的工厂实例
    pub fn register_instance(&self, reference: impl Into<String>, factory: QualifierFactoryRef) {
        self.declare(reference.into(), QualifierFactoryDeclaration::Instance(factory));
    }

    /// 登记可无参构造的工厂类型
    pub fn register_type(
        &self,
        reference: impl Into<String>,
        constructor: QualifierFactoryConstructor,
    ) {
        self.declare(reference.into(), QualifierFactoryDeclaration::Type(constructor));
    }

    /// 登记需要适配的可调用对象
    pub fn register_callable(&self, reference: impl Into<String>, constructor: CallableConstructor) {
        self.declare(reference.into(), QualifierFactoryDeclaration::Callable(constructor));
    }

    /// 引用是否已登记
    pub fn is_registered(&self, reference: &str) -> bool {
        self.declarations.contains_key(reference)
    }

    fn declare(&self, reference: String, declaration: QualifierFactoryDeclaration) {
        info!("登记限定符工厂: {} ({:?})", reference, declaration);
        self.resolved.remove(&reference);
        self.declarations.insert(reference, declaration);
    }

    /// 把类引用解析为工厂
    pub fn resolve_factory(&self, class_value: &ClassValue) -> QualifierResult<QualifierFactoryRef> {
        let reference = class_value.name();

        if let Some(instance) = class_value.instance() {
            match instance.downcast_ref::<QualifierFactoryRef>() {
                Some(factory) => {
                    debug!("使用引用自带的限定符工厂实例: {}", reference);
                    return Ok(factory.clone());
                }
                None => warn!(
                    "引用自带的实例不是 Arc<dyn QualifierFactory>，改用登记的声明: {}",
                    reference
                ),
            }
        }

        if self.cache_enabled {
            if let Some(factory) = self.resolved.get(reference) {
                return Ok(factory.value().clone());
            }
        }

        // 先取出声明再调用构造函数，构造期间不持有分片锁
        let declaration = self
            .declarations
            .get(reference)
            .map(|entry| entry.value().clone());

        let factory = match declaration {
            Some(QualifierFactoryDeclaration::Instance(factory)) => Some(factory),
            Some(QualifierFactoryDeclaration::Type(constructor)) => constructor(),
            Some(QualifierFactoryDeclaration::Callable(constructor)) => constructor(None, None)
                .map(|callable| {
                    Arc::new(CallableQualifierFactory {
                        reference: reference.to_string(),
                        callable,
                    }) as QualifierFactoryRef
                }),
            None => None,
        };

        match factory {
            Some(factory) => {
                if self.cache_enabled {
                    self.resolved.insert(reference.to_string(), factory.clone());
                }
                debug!("限定符工厂解析成功: {}", reference);
                Ok(factory)
            }
            None => {
                error!("无法实例化限定符工厂: {}", reference);
                Err(QualifierError::FactoryNotResolvable {
                    reference: reference.to_string(),
                })
            }
        }
    }
}

impl Default for QualifierFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QualifierFactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualifierFactoryRegistry")
            .field("declarations", &self.declarations.len())
            .field("resolved", &self.resolved.len())
            .field("cache_enabled", &self.cache_enabled)
            .finish()
    }
}

/// 可调用对象到工厂的适配器
///
/// 调用结果只能是限定符或空，其他类型立即报错。
struct CallableQualifierFactory {
    reference: String,
    callable: Arc<dyn MetadataCallable>,
}

impl QualifierFactory for CallableQualifierFactory {
    fn create_qualifier(&self, metadata: &AnnotationMetadata) -> QualifierResult<Option<QualifierRef>> {
        let Some(result) = self.callable.call(metadata) else {
            return Ok(None);
        };
        match result.downcast::<QualifierRef>() {
            Ok(qualifier) => Ok(Some(*qualifier)),
            Err(other) => {
                let actual = describe_value(other.as_ref());
                error!(
                    "以可调用对象表示的限定符工厂返回了错误类型: {} -> {}",
                    self.reference, actual
                );
                Err(QualifierError::IncorrectReturnType {
                    reference: self.reference.clone(),
                    actual,
                })
            }
        }
    }
}

fn describe_value(value: &(dyn Any + Send + Sync)) -> String {
    if value.is::<String>() || value.is::<&'static str>() {
        "String".to_string()
    } else if value.is::<bool>() {
        "bool".to_string()
    } else if value.is::<i32>() || value.is::<i64>() || value.is::<u32>() || value.is::<u64>() {
        "integer".to_string()
    } else {
        "unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{factory_class_value, Qualifiers};
    use infrastructure_common::AnnotationValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedFactory;

    impl QualifierFactory for NamedFactory {
        fn create_qualifier(
            &self,
            metadata: &AnnotationMetadata,
        ) -> QualifierResult<Option<QualifierRef>> {
            Ok(metadata
                .string_value("Color", "value")
                .map(Qualifiers::by_name))
        }
    }

    static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

    fn construct_named_factory() -> Option<QualifierFactoryRef> {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        Some(Arc::new(NamedFactory))
    }

    type Captured = Option<Box<dyn Any + Send + Sync>>;

    struct ReturnsValue(Option<Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>>);

    impl MetadataCallable for ReturnsValue {
        fn call(&self, _metadata: &AnnotationMetadata) -> Option<Box<dyn Any + Send + Sync>> {
            self.0.as_ref().map(|produce| produce())
        }
    }

    #[test]
    fn test_instance_carried_by_reference_wins() {
        let registry = QualifierFactoryRegistry::new();
        let factory: QualifierFactoryRef = Arc::new(NamedFactory);
        let class_value = ClassValue::with_instance("inline", Arc::new(factory));

        assert!(registry.resolve_factory(&class_value).is_ok());
        assert!(!registry.is_registered("inline"));
    }

    #[test]
    fn test_factory_class_value_wraps_reference() {
        let registry = QualifierFactoryRegistry::new();
        let class_value = factory_class_value("wrapped", Arc::new(NamedFactory));

        let factory = registry.resolve_factory(&class_value).unwrap();
        let metadata = AnnotationMetadata::empty()
            .with_annotation(AnnotationValue::new("Color").with_member("value", "red"));
        assert!(factory.create_qualifier(&metadata).unwrap().is_some());
    }

    #[test]
    fn test_concrete_instance_falls_back_to_declaration() {
        let registry = QualifierFactoryRegistry::new();
        let concrete = ClassValue::with_instance("concrete", Arc::new(NamedFactory));
        assert!(matches!(
            registry.resolve_factory(&concrete),
            Err(QualifierError::FactoryNotResolvable { .. })
        ));

        registry.register_instance("concrete", Arc::new(NamedFactory));
        assert!(registry.resolve_factory(&concrete).is_ok());
    }

    #[test]
    fn test_registered_type_is_constructed_once_when_cached() {
        let registry = QualifierFactoryRegistry::new();
        registry.register_type("named-factory", construct_named_factory);

        let before = CONSTRUCTIONS.load(Ordering::SeqCst);
        let class_value = ClassValue::new("named-factory");
        let first = registry.resolve_factory(&class_value).unwrap();
        let second = registry.resolve_factory(&class_value).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_failed_construction_is_configuration_error() {
        let registry = QualifierFactoryRegistry::with_cache(false);
        registry.register_type("broken", || None);

        let error = registry.resolve_factory(&ClassValue::new("broken")).err().unwrap();
        assert_eq!(
            error,
            QualifierError::FactoryNotResolvable {
                reference: "broken".to_string()
            }
        );

        let error = registry.resolve_factory(&ClassValue::new("unknown")).err().unwrap();
        assert!(matches!(error, QualifierError::FactoryNotResolvable { .. }));
    }

    #[test]
    fn test_callable_adapter_accepts_qualifiers_and_nothing() {
        let registry = QualifierFactoryRegistry::new();
        registry.register_callable(
            "callable-red",
            Arc::new(|_: Captured, _: Captured| {
                Some(Arc::new(ReturnsValue(Some(Box::new(|| {
                    Box::new(Qualifiers::by_name("red")) as Box<dyn Any + Send + Sync>
                })))) as Arc<dyn MetadataCallable>)
            }),
        );
        registry.register_callable(
            "callable-empty",
            Arc::new(|_: Captured, _: Captured| Some(Arc::new(ReturnsValue(None)) as Arc<dyn MetadataCallable>)),
        );

        let metadata = AnnotationMetadata::empty();
        let red = registry
            .resolve_factory(&ClassValue::new("callable-red"))
            .unwrap()
            .create_qualifier(&metadata)
            .unwrap();
        assert_eq!(&*red.unwrap(), &*Qualifiers::by_name("red"));

        let empty = registry
            .resolve_factory(&ClassValue::new("callable-empty"))
            .unwrap()
            .create_qualifier(&metadata)
            .unwrap();
        assert!(empty.is_none());
    }

    #[test]
    fn test_callable_adapter_rejects_other_values() {
        let registry = QualifierFactoryRegistry::new();
        registry.register_callable(
            "callable-string",
            Arc::new(|_: Captured, _: Captured| {
                Some(Arc::new(ReturnsValue(Some(Box::new(|| {
                    Box::new("red".to_string()) as Box<dyn Any + Send + Sync>
                })))) as Arc<dyn MetadataCallable>)
            }),
        );

        let factory = registry
            .resolve_factory(&ClassValue::new("callable-string"))
            .unwrap();
        let error = factory
            .create_qualifier(&AnnotationMetadata::empty())
            .err()
            .unwrap();
        assert_eq!(
            error,
            QualifierError::IncorrectReturnType {
                reference: "callable-string".to_string(),
                actual: "String".to_string(),
            }
        );
    }

    #[test]
    fn test_callable_without_instance_is_not_resolvable() {
        let registry = QualifierFactoryRegistry::new();
        registry.register_callable("callable-none", Arc::new(|_: Captured, _: Captured| None));

        assert!(registry
            .resolve_factory(&ClassValue::new("callable-none"))
            .is_err());
    }

    #[test]
    fn test_reregistration_invalidates_cache() {
        let registry = QualifierFactoryRegistry::new();
        registry.register_instance("swap", Arc::new(NamedFactory));
        let first = registry.resolve_factory(&ClassValue::new("swap")).unwrap();

        registry.register_instance("swap", Arc::new(NamedFactory));
        let second = registry.resolve_factory(&ClassValue::new("swap")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
