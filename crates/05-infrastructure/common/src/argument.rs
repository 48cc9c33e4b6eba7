//! 注入点参数描述

use crate::metadata::{AnnotationMetadata, AnnotationValue, TypeInfo};
use std::fmt;

/// 参数
///
/// 描述一个被请求的值：原始类型、泛型参数、声明的注解元数据，以及它本身是否为
/// 延迟提供者（即请求的是 `Provider<X>` 而不是 `X`）。构造完成后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Argument {
    name: String,
    type_info: TypeInfo,
    type_parameters: Vec<Argument>,
    annotation_metadata: AnnotationMetadata,
    provider: bool,
}

impl Argument {
    /// 创建指定类型的参数
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_info = TypeInfo::of::<T>();
        Self {
            name: type_info.short_name().to_string(),
            type_info,
            type_parameters: Vec::new(),
            annotation_metadata: AnnotationMetadata::empty(),
            provider: false,
        }
    }

    /// 创建以 `P` 为提供者类型、`T` 为目标类型的提供者参数
    ///
    /// 名称默认取目标类型的名称。
    pub fn provider_of<P: ?Sized + 'static, T: ?Sized + 'static>() -> Self {
        let target = Self::of::<T>();
        let mut argument = Self::of::<P>();
        argument.name = target.name.clone();
        argument.type_parameters.push(target);
        argument.provider = true;
        argument
    }

    /// 设置参数名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: AnnotationValue) -> Self {
        self.annotation_metadata = self.annotation_metadata.with_annotation(annotation);
        self
    }

    /// 替换注解元数据
    pub fn with_annotation_metadata(mut self, metadata: AnnotationMetadata) -> Self {
        self.annotation_metadata = metadata;
        self
    }

    /// 添加泛型参数
    pub fn with_type_parameter(mut self, parameter: Argument) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    /// 参数名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 原始类型
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 泛型参数
    pub fn type_parameters(&self) -> &[Argument] {
        &self.type_parameters
    }

    /// 第一个泛型参数
    pub fn first_type_parameter(&self) -> Option<&Argument> {
        self.type_parameters.first()
    }

    /// 注解元数据
    pub fn annotation_metadata(&self) -> &AnnotationMetadata {
        &self.annotation_metadata
    }

    /// 是否为延迟提供者
    pub fn is_provider(&self) -> bool {
        self.provider
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_info.short_name())?;
        if !self.type_parameters.is_empty() {
            let parameters = self
                .type_parameters
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "<{}>", parameters)?;
        }
        Ok(())
    }
}
