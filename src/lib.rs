pub mod prompt_templating;
pub mod providers;
pub mod template;

pub use prompt_templating::{PromptTemplate, PromptTemplating, TemplatedPromptError};
pub use providers::{FetchRequest, Prompt, PromptProvider, PromptSelector, ProviderError};
pub use template::{CompileError, Template, VariableSet, compile};
