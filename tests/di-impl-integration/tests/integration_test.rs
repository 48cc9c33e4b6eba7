//! Centralized integration tests for di-impl crate
use di_abstractions::{
    BeanProvider, ContainerConfig, Qualifier, QualifierFactory, QualifierRef, Qualifiers,
};
use di_impl::{
    BeanContextBuilder, BeanProviderDefinition, DefaultBeanContext, LazyRuntimeQualifiedQualifier,
    QualifierFactoryRegistry, RuntimeQualifiedQualifier, ANY, MEMBER_LAZY, NAMED,
    RUNTIME_QUALIFIED,
};
use infrastructure_common::{
    AnnotationMetadata, AnnotationValue, BeanDefinition, ClassValue, DependencyError,
    Lifetime, QualifierError, QualifierResult, TypeInfo, VALUE_MEMBER,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 测试组件
#[derive(Debug)]
struct Service {
    color: &'static str,
}

/// 读取注入点上的 `Color` 注解，生成按名称的限定符
struct ColorQualifierFactory;

impl QualifierFactory for ColorQualifierFactory {
    fn create_qualifier(&self, metadata: &AnnotationMetadata) -> QualifierResult<Option<QualifierRef>> {
        Ok(metadata
            .string_value("Color", VALUE_MEMBER)
            .map(Qualifiers::by_name))
    }
}

fn colored_context(registry: Arc<QualifierFactoryRegistry>) -> anyhow::Result<Arc<DefaultBeanContext>> {
    let mut builder = BeanContextBuilder::new().with_qualifier_factories(registry);
    for color in ["red", "blue"] {
        builder = builder.register_singleton(
            BeanDefinition::of::<Service>().named(color),
            Arc::new(Service { color }),
        );
    }
    Ok(builder.build()?)
}

fn color_registry() -> Arc<QualifierFactoryRegistry> {
    let registry = QualifierFactoryRegistry::new();
    registry.register_instance("color", Arc::new(ColorQualifierFactory));
    Arc::new(registry)
}

fn hash_of(qualifier: &dyn Qualifier) -> u64 {
    let mut hasher = DefaultHasher::new();
    qualifier.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_named_provider_scenario() -> anyhow::Result<()> {
    init_test_logger();
    let context = colored_context(color_registry())?;
    let injection_point = BeanProviderDefinition::injection_point::<Service>()
        .with_annotation(AnnotationValue::new(NAMED).with_member(VALUE_MEMBER, "red"));
    let provider = context.get_provider::<Service>(&injection_point)?;

    assert_eq!(provider.get()?.color, "red");
    assert_eq!(provider.get_with(Some(Qualifiers::by_name("blue")))?.color, "blue");
    assert!(provider.find(Some(Qualifiers::by_name("green")))?.is_none());
    // 注入点限定符与调用方限定符取交集
    assert!(provider.find(Some(Qualifiers::by_name("blue")))?.is_none());
    assert_eq!(provider.find(None)?.map(|s| s.color), Some("red"));
    assert!(provider.is_unique()?);
    assert!(provider.is_present()?);
    assert_eq!(provider.get_definition()?.name, "red");
    Ok(())
}

#[test]
fn test_runtime_qualified_provider_scenario() -> anyhow::Result<()> {
    init_test_logger();
    let context = colored_context(color_registry())?;
    let injection_point = BeanProviderDefinition::injection_point::<Service>()
        .with_annotation(
            AnnotationValue::new(RUNTIME_QUALIFIED)
                .with_class_member(VALUE_MEMBER, ClassValue::new("color")),
        )
        .with_annotation(AnnotationValue::new("Color").with_member(VALUE_MEMBER, "blue"));
    let provider = context.get_provider::<Service>(&injection_point)?;

    assert_eq!(provider.get()?.color, "blue");
    assert_eq!(provider.get_with(Some(Qualifiers::by_name("red")))?.color, "red");
    assert!(provider.is_unique()?);
    Ok(())
}

#[test]
fn test_any_qualifier_is_no_constraint() -> anyhow::Result<()> {
    init_test_logger();
    let context = BeanContextBuilder::new()
        .with_qualifier_factories(Arc::new(QualifierFactoryRegistry::new()))
        .register_factory(BeanDefinition::of::<Service>().named("first"), |_, _| {
            Ok(Service { color: "none" })
        })
        .register_factory(BeanDefinition::of::<Service>().named("second"), |_, _| {
            Ok(Service { color: "none" })
        })
        .build()?;
    let injection_point =
        BeanProviderDefinition::injection_point::<Service>().with_annotation(AnnotationValue::new(ANY));
    let provider = context.get_provider::<Service>(&injection_point)?;

    assert!(!provider.is_unique()?);
    let error = provider.get().unwrap_err();
    assert!(error.is_non_unique(), "{error}");
    assert_eq!(provider.iter()?.count(), 2);
    Ok(())
}

#[test]
fn test_eager_provider_without_factory_member_fails() {
    init_test_logger();
    let context = BeanContextBuilder::new()
        .with_qualifier_factories(color_registry())
        .build()
        .unwrap();
    let injection_point = BeanProviderDefinition::injection_point::<Service>().with_annotation(
        AnnotationValue::new(RUNTIME_QUALIFIED).with_member(MEMBER_LAZY, false),
    );

    let error = context.get_provider::<Service>(&injection_point).unwrap_err();
    assert!(matches!(
        error,
        DependencyError::Qualifier {
            source: QualifierError::MissingMember { .. }
        }
    ));
}

#[test]
fn test_empty_provider_defers_not_found() -> anyhow::Result<()> {
    init_test_logger();
    let context = BeanContextBuilder::new()
        .with_qualifier_factories(Arc::new(QualifierFactoryRegistry::new()))
        .build()?;
    let provider = context.get_provider::<Service>(&BeanProviderDefinition::injection_point::<Service>())?;

    assert!(!provider.is_unique()?);
    assert!(!provider.is_present()?);
    assert!(provider.find(None)?.is_none());
    assert!(provider.get().unwrap_err().is_not_found());
    assert!(provider.get_definition().unwrap_err().is_not_found());
    assert_eq!(provider.iter()?.count(), 0);
    Ok(())
}

#[test]
fn test_disallowing_empty_providers_fails_at_construction() -> anyhow::Result<()> {
    init_test_logger();
    let context = BeanContextBuilder::new()
        .with_config(ContainerConfig {
            allow_empty_providers: Some(false),
            ..ContainerConfig::default()
        })
        .with_qualifier_factories(Arc::new(QualifierFactoryRegistry::new()))
        .build()?;

    let error = context
        .get_provider::<Service>(&BeanProviderDefinition::injection_point::<Service>())
        .unwrap_err();
    assert!(error.is_not_found());
    Ok(())
}

#[test]
fn test_lazy_qualifier_retries_until_resolved() -> anyhow::Result<()> {
    init_test_logger();
    let ready = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = QualifierFactoryRegistry::new();
    {
        let ready = ready.clone();
        let calls = calls.clone();
        registry.register_instance(
            "late",
            Arc::new(move |_: &AnnotationMetadata| {
                calls.fetch_add(1, Ordering::SeqCst);
                (ready.load(Ordering::SeqCst) > 0).then(|| Qualifiers::by_name("blue"))
            }),
        );
    }
    let context = colored_context(Arc::new(registry))?;
    let injection_point = BeanProviderDefinition::injection_point::<Service>().with_annotation(
        AnnotationValue::new(RUNTIME_QUALIFIED)
            .with_member(MEMBER_LAZY, true)
            .with_class_member(VALUE_MEMBER, ClassValue::new("late")),
    );
    let provider = context.get_provider::<Service>(&injection_point)?;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // 工厂尚未就绪时没有候选
    assert!(provider.get().unwrap_err().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    ready.store(1, Ordering::SeqCst);
    assert_eq!(provider.get()?.color, "blue");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert_eq!(provider.get()?.color, "blue");
    assert!(provider.is_unique()?);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_runtime_qualifier_matches_delegate() -> anyhow::Result<()> {
    init_test_logger();
    let registry = color_registry();
    let metadata = AnnotationMetadata::empty()
        .with_annotation(
            AnnotationValue::new(RUNTIME_QUALIFIED)
                .with_class_member(VALUE_MEMBER, ClassValue::new("color")),
        )
        .with_annotation(AnnotationValue::new("Color").with_member(VALUE_MEMBER, "red"));
    let runtime = RuntimeQualifiedQualifier::from_metadata(&metadata, &registry)?;
    let delegate = Qualifiers::by_name("red");

    let candidates = vec![
        Arc::new(BeanDefinition::of::<Service>().named("red")),
        Arc::new(BeanDefinition::of::<Service>().named("blue")),
    ];
    let bean_type = TypeInfo::of::<Service>();
    assert_eq!(
        runtime.reduce(&bean_type, candidates.clone())?,
        delegate.reduce(&bean_type, candidates)?
    );
    assert!(runtime.contains(&runtime));
    assert!(runtime.contains(delegate.as_ref()));

    let same: QualifierRef = Arc::new(RuntimeQualifiedQualifier::new(Qualifiers::by_name("red")));
    let other: QualifierRef = Arc::new(RuntimeQualifiedQualifier::new(Qualifiers::by_name("blue")));
    assert!(runtime.eq_qualifier(same.as_ref()));
    assert_eq!(hash_of(&runtime), hash_of(same.as_ref()));
    assert!(!runtime.eq_qualifier(other.as_ref()));
    assert_eq!(runtime.to_string(), "@RuntimeQualified(@Named(red))");

    let lazy = LazyRuntimeQualifiedQualifier::from_metadata(&metadata, &registry)?;
    assert!(lazy.contains(&lazy));
    Ok(())
}

#[test]
fn test_iteration_requeries_registry() -> anyhow::Result<()> {
    init_test_logger();
    let context = colored_context(Arc::new(QualifierFactoryRegistry::new()))?;
    let provider = context.get_provider::<Service>(&BeanProviderDefinition::injection_point::<Service>())?;

    assert_eq!(provider.iter()?.count(), 2);
    context.register_singleton(
        BeanDefinition::of::<Service>().named("green"),
        Arc::new(Service { color: "green" }),
    )?;

    let colors: Vec<&str> = provider.iter()?.map(|s| s.color).collect();
    assert_eq!(colors, vec!["red", "blue", "green"]);
    let streamed = provider
        .stream()?
        .map(|s| s.map(|s| s.color))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(streamed, colors);
    Ok(())
}

#[test]
fn test_transient_beans_are_created_per_stream_item() -> anyhow::Result<()> {
    init_test_logger();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let context = BeanContextBuilder::new()
        .with_qualifier_factories(Arc::new(QualifierFactoryRegistry::new()))
        .register_factory(
            BeanDefinition::of::<Service>().with_lifetime(Lifetime::Transient),
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Service { color: "fresh" })
            },
        )
        .build()?;
    let provider = context.get_provider::<Service>(&BeanProviderDefinition::injection_point::<Service>())?;

    let mut stream = provider.stream()?;
    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert!(stream.next().is_some());
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(provider.is_present()?);
    assert!(provider.get_definition().is_ok());
    assert_eq!(created.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_provider_is_shared_across_threads() -> anyhow::Result<()> {
    init_test_logger();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let context = BeanContextBuilder::new()
        .with_qualifier_factories(Arc::new(QualifierFactoryRegistry::new()))
        .register_factory(
            BeanDefinition::of::<Service>().with_lifetime(Lifetime::Singleton),
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Service { color: "shared" })
            },
        )
        .build()?;
    let provider = Arc::new(
        context.get_provider::<Service>(&BeanProviderDefinition::injection_point::<Service>())?,
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = provider.clone();
            tokio::task::spawn_blocking(move || provider.get().map(|s| s.color))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await??, "shared");
    }
    assert_eq!(created.load(Ordering::SeqCst), 1);
    Ok(())
}
