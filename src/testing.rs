//! Test helpers for code that registers or resolves mappers.
//!
//! These are small instrumented factories and mappers used by the crate's
//! own tests and by integration tests of applications that plug their
//! mappers into a [`MappingRegistry`](crate::MappingRegistry).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rowmap_core::{ResultRow, TypeDescriptor};

use crate::context::{Configuration, StatementContext};
use crate::error::MappingResult;
use crate::mapper::{
    ColumnMapper, ColumnMapperFactory, ColumnMapperRef, RowMapper, RowMapperFactory, RowMapperRef,
};

/// Statement context over a default configuration.
pub fn test_context() -> StatementContext {
    Configuration::default().into_statement_context()
}

/// Column mapper that ignores the row and returns a fixed string.
#[derive(Debug, Clone)]
pub struct ConstantMapper(pub &'static str);

impl ColumnMapper for ConstantMapper {
    type Output = String;

    fn map(&self, _row: &ResultRow, _column: usize, _ctx: &StatementContext) -> MappingResult<String> {
        Ok(self.0.to_string())
    }
}

impl RowMapper for ConstantMapper {
    type Output = String;

    fn map(&self, _row: &ResultRow, _ctx: &StatementContext) -> MappingResult<String> {
        Ok(self.0.to_string())
    }
}

/// Column factory that builds a fresh [`ConstantMapper`] for one descriptor
/// and counts how often it was asked.
pub struct CountingColumnFactory {
    ty: TypeDescriptor,
    value: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CountingColumnFactory {
    pub fn new(ty: TypeDescriptor, value: &'static str) -> Self {
        Self {
            ty,
            value,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, still readable after the factory is registered.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl ColumnMapperFactory for CountingColumnFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        _ctx: &StatementContext,
    ) -> MappingResult<Option<ColumnMapperRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *ty != self.ty {
            return Ok(None);
        }
        let mapper: ColumnMapperRef = Arc::new(ConstantMapper(self.value));
        Ok(Some(mapper))
    }
}

/// Row factory that builds a fresh [`ConstantMapper`] for one descriptor
/// and counts how often it was asked.
pub struct CountingRowFactory {
    ty: TypeDescriptor,
    value: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CountingRowFactory {
    pub fn new(ty: TypeDescriptor, value: &'static str) -> Self {
        Self {
            ty,
            value,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl RowMapperFactory for CountingRowFactory {
    fn build(
        &self,
        ty: &TypeDescriptor,
        _ctx: &StatementContext,
    ) -> MappingResult<Option<RowMapperRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *ty != self.ty {
            return Ok(None);
        }
        let mapper: RowMapperRef = Arc::new(ConstantMapper(self.value));
        Ok(Some(mapper))
    }
}
