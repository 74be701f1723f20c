/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::any::Any;
use std::fmt;

/// A type-erased value moved between the codec layers.
///
/// Decode paths produce values whose concrete type is only known to the
/// monomorphized adapter that eventually consumes them; this box carries them
/// in between.
pub(crate) struct AnyValue {
    inner: Box<dyn Any + Send + Sync>,
}

impl AnyValue {
    pub(crate) fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
        }
    }

    pub(crate) fn downcast<T: 'static>(self) -> Result<T, Self> {
        match self.inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self { inner }),
        }
    }

    #[cfg(test)]
    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnyValue")
    }
}
