use std::env;

#[cfg(all(feature = "reqwest", feature = "ureq"))]
compile_error!("Features 'reqwest' and 'ureq' are mutually exclusive.");

#[cfg(not(any(feature = "reqwest", feature = "ureq")))]
compile_error!("One of the features 'reqwest' and 'ureq' must be enabled.");

use serde::ser::SerializeSeq;
#[cfg(feature = "ureq")]
use ureq;

#[cfg(feature = "reqwest")]
use reqwest;

const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
const OPENROUTER_API_BASE: &str = "OPENROUTER_API_BASE";
const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The configuration contains errors: {0}")]
    BadConfigurationError(String),

    #[error("Failed to serialize request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Failed to deserialize response: {0}")]
    DeserializationError(serde_json::Error),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },
}

pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-3.5-turbo";

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// One conversation turn. Ordering within a history matters; role
/// alternation is the caller's business and is not validated here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub content: String,
    pub role: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: ROLE_SYSTEM.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: ROLE_USER.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: ROLE_ASSISTANT.into(),
        }
    }
}

#[derive(Debug)]
pub enum Stop {
    String(String),
    Array(Vec<String>),
}

impl serde::Serialize for Stop {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Stop::String(string) => serializer.serialize_str(string),
            Stop::Array(strings) => {
                let mut array = serializer.serialize_seq(Some(strings.len()))?;

                for string in strings {
                    array.serialize_element(string)?;
                }

                array.end()
            }
        }
    }
}

// NOTE: OpenRouter fronts many upstream implementations, so we only send
// options in requests that are actually set. Some backends don't like
// seeing options they don't know, even if they're "null".

/// Chat completions request structure.
///
/// For reference, see: https://openrouter.ai/docs/api-reference/chat-completion
///
/// To construct this structure easily use the default trait:
///
/// ```rust
/// let request = mini_openrouter::ChatCompletions {
///   messages: vec![
///     mini_openrouter::Message::user("Hello! Can you tell me a fun fact about space?"),
///   ],
///   ..Default::default()
/// };
/// ```
#[derive(Debug, serde::Serialize)]
pub struct ChatCompletions {
    pub messages: Vec<Message>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Stop>,
    /// Must be 'false': Only non-streaming is supported.
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Default for ChatCompletions {
    fn default() -> Self {
        Self {
            messages: Default::default(),
            model: DEFAULT_CHAT_MODEL.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            seed: None,
            stop: None,
            stream: false,
            user: None,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct Choice {
    pub index: Option<usize>,
    pub message: Message,
    pub finish_reason: Option<String>,
}

// Every field optional: backends that return a usage object at all don't
// always fill in all of it.
#[derive(Debug, serde::Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChatCompletionsResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub created: Option<usize>,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>, // Not all backends return this
}

impl ChatCompletionsResponse {
    /// The generated reply text: `choices[0].message.content`, or `None`
    /// when the response carries no choices.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Error payload shape OpenRouter returns alongside non-2xx statuses.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[allow(dead_code)]
    code: Option<serde_json::Value>,
}

/// Extract the remote error message from a non-2xx body, falling back to
/// the raw body text when it isn't the structured payload.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail returned".into()
            } else {
                trimmed.to_string()
            }
        }
    }
}

/// What to send: either a single user message or a prebuilt conversation
/// history. You can construct it with `.into()`:
///
/// ```rust
/// let prompt: mini_openrouter::Prompt = "Hello!".into();
/// ```
#[derive(Debug)]
pub enum Prompt {
    Text(String),
    History(Vec<Message>),
}

impl Prompt {
    fn into_messages(self) -> Vec<Message> {
        match self {
            Prompt::Text(text) => vec![Message::user(text)],
            Prompt::History(messages) => messages,
        }
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Self::History(messages)
    }
}

impl From<&[Message]> for Prompt {
    fn from(messages: &[Message]) -> Self {
        Self::History(messages.to_vec())
    }
}

#[cfg(feature = "ureq")]
struct ClientImpl {
    client: ureq::Agent,
    token: Option<String>,
}

#[cfg(feature = "ureq")]
impl ClientImpl {
    fn new(token: Option<String>) -> Result<ClientImpl, Error> {
        Ok(Self {
            client: ureq::Agent::new(),
            token,
        })
    }

    fn do_request(&self, url: String, body: String) -> Result<String, Error> {
        let mut request = self
            .client
            .post(&url)
            .set("Content-Type", "application/json");

        if let Some(token) = self.token.as_ref() {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        let response = match request.send_string(&body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                return Err(Error::ApiError {
                    status,
                    message: api_error_message(&text),
                });
            }
            Err(e) => return Err(Error::NetworkError(e.to_string())),
        };

        let body = response
            .into_string()
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        Ok(body)
    }
}

#[cfg(feature = "reqwest")]
struct ClientImpl {
    client: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ClientImpl {
    fn new(token: Option<String>) -> Result<ClientImpl, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(token) = token {
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::BadConfigurationError(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::BadConfigurationError(e.to_string()))?;

        Ok(Self { client })
    }

    async fn do_request(&self, url: String, body: String) -> Result<String, Error> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::ApiError {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        Ok(text)
    }
}

pub struct Client {
    inner: ClientImpl,
    base_uri: String,
}

impl Client {
    /// Creates a new `Client` instance.
    ///
    /// This function will first check for environment variables `OPENROUTER_API_BASE` and
    /// `OPENROUTER_API_KEY`. If they are not set, it will use the provided `base_uri` and
    /// `token` parameters. If neither are set, it will use the default API base URI.
    ///
    /// If a `token` is not provided and `base_uri` is set to the OpenRouter API base URI,
    /// an error will be returned.
    ///
    /// # Arguments
    ///
    /// * `base_uri`: The base URI of the API, or `None` to use the environment variable or default.
    /// * `token`: The API token, or `None` to use the environment variable.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `Client` instance, or an `Error` if the configuration is invalid.
    pub fn new(base_uri: Option<String>, token: Option<String>) -> Result<Client, Error> {
        let env_base_uri = env::var(OPENROUTER_API_BASE).unwrap_or_default();
        let env_token = env::var(OPENROUTER_API_KEY).unwrap_or_default();

        let base_uri = if env_base_uri.is_empty() {
            if let Some(uri) = base_uri {
                uri
            } else {
                DEFAULT_API_BASE.to_string()
            }
        } else {
            env_base_uri
        };

        let token = if env_token.is_empty() {
            token
        } else {
            Some(env_token)
        };

        Self::new_without_environment(base_uri, token)
    }

    /// Creates a new `Client` instance without checking environment variables.
    ///
    /// This function is used internally by `new` to create a client without checking for
    /// environment variables. It is also the constructor to reach for in tests, since it
    /// never reads ambient process state.
    ///
    /// # Arguments
    ///
    /// * `base_uri`: The base URI of the API.
    /// * `token`: The API token, or `None` if not required.
    ///
    /// # Returns
    ///
    /// If `base_uri` is empty, an error will be returned.
    /// If `base_uri` is set to the OpenRouter API base URI and `token` is `None`, an error
    /// will be returned. No network is touched either way.
    /// A `Result` containing the new `Client` instance, or an `Error` if the configuration is invalid.
    pub fn new_without_environment(
        base_uri: String,
        token: Option<String>,
    ) -> Result<Client, Error> {
        if base_uri.is_empty() {
            return Err(Error::BadConfigurationError("No base URI given".into()));
        }

        // Only check if there's a token if we're connecting to OpenRouter.
        // Custom endpoints may not require it, so don't enforce it for them.
        if base_uri == DEFAULT_API_BASE && token.is_none() {
            return Err(Error::BadConfigurationError("Missing api token".into()));
        }

        let inner = ClientImpl::new(token)?;
        Ok(Self { inner, base_uri })
    }

    /// Creates a new `Client` instance from environment variables.
    ///
    /// This function will read the `OPENROUTER_API_BASE` and `OPENROUTER_API_KEY` environment
    /// variables and use them to create a client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `Client` instance, or an `Error` if the environment
    /// variables are not set.
    pub fn new_from_environment() -> Result<Client, Error> {
        let env_base_uri = env::var(OPENROUTER_API_BASE)
            .map_err(|e| Error::BadConfigurationError(e.to_string()))?;
        let env_token = env::var(OPENROUTER_API_KEY).unwrap_or_default();

        let token = if env_token.is_empty() {
            None
        } else {
            Some(env_token)
        };

        Self::new_without_environment(env_base_uri, token)
    }

    /// Sends a request to OpenRouter to generate a completion for a chat conversation.
    ///
    /// This function takes a `ChatCompletions` struct as input, which defines the parameters
    /// of the completion request, including the chat history and model to use. The message
    /// history is forwarded unmodified and in order.
    ///
    /// Each call issues exactly one POST; there is no retry, caching, or deduplication.
    ///
    /// # Arguments
    ///
    /// * `request`: The `ChatCompletions` struct containing the request parameters.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `ChatCompletionsResponse` struct, or an `Error` if the
    /// request fails: `NetworkError` for transport failures, `ApiError` for non-2xx
    /// statuses (carrying the remote error message when one was returned), and
    /// `DeserializationError` for a success status with an unexpected body.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use mini_openrouter::{Client, ChatCompletions, Message};
    ///
    /// let client = Client::new(None, None).unwrap();
    ///
    /// // Create a new chat completion request
    /// let mut request = ChatCompletions::default();
    ///
    /// // Add a message to the chat history
    /// request.messages.push(Message::user("Hello!"));
    ///
    /// // Send the request to OpenRouter
    /// let response = client.chat_completions(&request).await.unwrap();
    ///
    /// // Print the generated completion
    /// println!("{}", response.text().unwrap_or(""));
    /// ```
    #[cfg(feature = "reqwest")]
    pub async fn chat_completions(
        &self,
        request: &ChatCompletions,
    ) -> Result<ChatCompletionsResponse, Error> {
        let url = format!("{}/chat/completions", self.base_uri);
        let body = serde_json::to_string(request).map_err(Error::SerializationError)?;
        let response = self.inner.do_request(url, body).await?;

        serde_json::from_str(&response).map_err(Error::DeserializationError)
    }

    /// Sends a request to OpenRouter to generate a completion for a chat conversation.
    ///
    /// This function takes a `ChatCompletions` struct as input, which defines the parameters
    /// of the completion request, including the chat history and model to use. The message
    /// history is forwarded unmodified and in order.
    ///
    /// Each call issues exactly one POST; there is no retry, caching, or deduplication.
    ///
    /// # Arguments
    ///
    /// * `request`: The `ChatCompletions` struct containing the request parameters.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `ChatCompletionsResponse` struct, or an `Error` if the
    /// request fails: `NetworkError` for transport failures, `ApiError` for non-2xx
    /// statuses (carrying the remote error message when one was returned), and
    /// `DeserializationError` for a success status with an unexpected body.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use mini_openrouter::{Client, ChatCompletions, Message};
    ///
    /// let client = Client::new(None, None).unwrap();
    ///
    /// // Create a new chat completion request
    /// let mut request = ChatCompletions::default();
    ///
    /// // Add a message to the chat history
    /// request.messages.push(Message::user("Hello!"));
    ///
    /// // Send the request to OpenRouter
    /// let response = client.chat_completions(&request).unwrap();
    ///
    /// // Print the generated completion
    /// println!("{}", response.text().unwrap_or(""));
    /// ```
    #[cfg(feature = "ureq")]
    pub fn chat_completions(
        &self,
        request: &ChatCompletions,
    ) -> Result<ChatCompletionsResponse, Error> {
        let url = format!("{}/chat/completions", self.base_uri);
        let body = serde_json::to_string(request).map_err(Error::SerializationError)?;
        let response = self.inner.do_request(url, body)?;

        serde_json::from_str(&response).map_err(Error::DeserializationError)
    }

    /// Sends a single message or a prebuilt conversation history with the default model.
    ///
    /// A bare string is wrapped into a one-turn history with role `user`; a `Vec<Message>`
    /// is forwarded as-is. Shorthand for building a `ChatCompletions` with defaults.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = mini_openrouter::Client::new(None, None).unwrap();
    /// let response = client.send("Hello! Can you tell me a fun fact about space?").await.unwrap();
    /// println!("{}", response.text().unwrap_or(""));
    /// ```
    #[cfg(feature = "reqwest")]
    pub async fn send(
        &self,
        prompt: impl Into<Prompt>,
    ) -> Result<ChatCompletionsResponse, Error> {
        self.send_with_model(prompt, DEFAULT_CHAT_MODEL).await
    }

    /// Like [`Client::send`], but naming the model to use.
    ///
    /// The model string is passed through verbatim; an unknown model is an error the
    /// remote service reports, not one caught here.
    #[cfg(feature = "reqwest")]
    pub async fn send_with_model(
        &self,
        prompt: impl Into<Prompt>,
        model: &str,
    ) -> Result<ChatCompletionsResponse, Error> {
        let request = ChatCompletions {
            messages: prompt.into().into_messages(),
            model: model.to_string(),
            ..Default::default()
        };
        self.chat_completions(&request).await
    }

    /// Sends a single message or a prebuilt conversation history with the default model.
    ///
    /// A bare string is wrapped into a one-turn history with role `user`; a `Vec<Message>`
    /// is forwarded as-is. Shorthand for building a `ChatCompletions` with defaults.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// let client = mini_openrouter::Client::new(None, None).unwrap();
    /// let response = client.send("Hello! Can you tell me a fun fact about space?").unwrap();
    /// println!("{}", response.text().unwrap_or(""));
    /// ```
    #[cfg(feature = "ureq")]
    pub fn send(&self, prompt: impl Into<Prompt>) -> Result<ChatCompletionsResponse, Error> {
        self.send_with_model(prompt, DEFAULT_CHAT_MODEL)
    }

    /// Like [`Client::send`], but naming the model to use.
    ///
    /// The model string is passed through verbatim; an unknown model is an error the
    /// remote service reports, not one caught here.
    #[cfg(feature = "ureq")]
    pub fn send_with_model(
        &self,
        prompt: impl Into<Prompt>,
        model: &str,
    ) -> Result<ChatCompletionsResponse, Error> {
        let request = ChatCompletions {
            messages: prompt.into().into_messages(),
            model: model.to_string(),
            ..Default::default()
        };
        self.chat_completions(&request)
    }
}
