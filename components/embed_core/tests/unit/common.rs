//! Shared fixture: one runtime, isolate, template and context.

use embed_core::{
    CallbackId, CallbackInfo, EmbedError, Exception, ExecutionContext, GlobalTemplate, Isolate,
    IsolateConfig, PlatformConfig, Runtime, Value,
};

pub struct Fixture {
    pub context: ExecutionContext,
    pub template: GlobalTemplate,
    pub isolate: Isolate,
    pub runtime: Runtime,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(IsolateConfig::default())
    }

    pub fn with_config(config: IsolateConfig) -> Self {
        Self::with_platform(PlatformConfig::new(), config)
    }

    pub fn with_platform(platform: PlatformConfig, config: IsolateConfig) -> Self {
        let runtime = Runtime::new(platform).expect("runtime");
        let isolate = runtime.create_isolate_with(&config).expect("isolate");
        let template = isolate.create_template().expect("template");
        let context = isolate.create_context(&template).expect("context");
        Fixture {
            context,
            template,
            isolate,
            runtime,
        }
    }

    pub fn eval(&self, source: &str) -> Value {
        self.context
            .evaluate(source)
            .unwrap_or_else(|e| panic!("`{source}` failed: {e}"))
    }

    pub fn int(&self, source: &str) -> i64 {
        self.eval(source).to_int().unwrap()
    }

    pub fn string(&self, source: &str) -> String {
        self.eval(source).to_rust_string().unwrap()
    }

    pub fn exception(&self, source: &str) -> Exception {
        match self.context.evaluate(source) {
            Err(EmbedError::Exception(exception)) => exception,
            Err(other) => panic!("`{source}` failed without an exception: {other}"),
            Ok(value) => panic!("`{source}` unexpectedly produced {value:?}"),
        }
    }

    pub fn bind<F>(&mut self, name: &str, function: F) -> CallbackId
    where
        F: Fn(&mut CallbackInfo<'_>) + Send + Sync + 'static,
    {
        self.context
            .register_function(&mut self.template, name, function)
            .expect("bind host function")
    }
}
