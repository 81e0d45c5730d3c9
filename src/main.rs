mod config;
mod error;
mod quiz;
mod render;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use error::QuizError;
use quiz::{ai_helper::QuizHelper, model_client::ModelBackend, session::QuizSession, Difficulty, Label};
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, InMemStorage, SqliteStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
    types::{
        ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
        KeyboardRemove,
    },
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type QuizStorage = Arc<ErasedStorage<State>>;
type Helper = Arc<QuizHelper<ModelBackend>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveTopic {
        session: QuizSession,
    },
    ReceiveDifficulty {
        topic: String,
        session: QuizSession,
    },
}

impl State {
    fn session_mut(&mut self) -> Option<&mut QuizSession> {
        match self {
            State::Start => None,
            State::ReceiveTopic { session } | State::ReceiveDifficulty { session, .. } => {
                Some(session)
            }
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let backend = match config.build_backend() {
        Ok(backend) => backend,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    log::info!("Using {:?} model {}", config.provider, config.model);
    let helper: Helper = Arc::new(QuizHelper::new(backend, config.generation.clone()));

    let storage: QuizStorage = match &config.db_path {
        Some(path) => {
            log::info!("Opening dialogue storage at {}", path);
            match SqliteStorage::open(path, Json).await {
                Ok(storage) => storage.erase(),
                Err(err) => {
                    log::error!("Failed to open {}: {}", path, err);
                    std::process::exit(1);
                }
            }
        }
        None => InMemStorage::<State>::new().erase(),
    };

    let bot = Bot::new(config.bot_token.clone());

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![storage, helper])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let messages = Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::ReceiveTopic { session }].endpoint(receive_topic))
        .branch(
            dptree::case![State::ReceiveDifficulty { topic, session }]
                .endpoint(receive_difficulty),
        );

    let answers = Update::filter_callback_query()
        .enter_dialogue::<CallbackQuery, ErasedStorage<State>, State>()
        .endpoint(receive_answer);

    dptree::entry().branch(messages).branch(answers)
}

const GREETING_TEXT: &str = "Hi! I generate multiple choice quizzes on any topic. Enter a topic (e.g. Political Theory):";
const START_COMMAND: &str = "/start";
const SCORE_COMMAND: &str = "/score";
const ANY_DIFFICULTY: &str = "Any";

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;

    dialogue
        .update(State::ReceiveTopic {
            session: QuizSession::new(),
        })
        .await?;
    Ok(())
}

async fn receive_topic(
    bot: Bot,
    dialogue: QuizDialogue,
    session: QuizSession,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please enter a topic (as text)")
            .await?;
        return Ok(());
    };

    match text.trim() {
        START_COMMAND => start(bot, dialogue, msg.clone()).await,
        SCORE_COMMAND => {
            let reply = if session.is_active() {
                render::scoreboard(&session)
            } else {
                "No quiz loaded yet. Enter a topic first!".to_string()
            };
            bot.send_message(msg.chat.id, reply).await?;
            Ok(())
        }
        "" => {
            bot.send_message(msg.chat.id, "Please enter a topic first!")
                .await?;
            Ok(())
        }
        topic => {
            let mut levels: Vec<KeyboardButton> = Difficulty::ALL
                .into_iter()
                .map(|d| KeyboardButton::new(d.name()))
                .collect();
            levels.push(KeyboardButton::new(ANY_DIFFICULTY));

            bot.send_message(msg.chat.id, "Select difficulty level:")
                .reply_markup(KeyboardMarkup::new(vec![levels]))
                .await?;

            dialogue
                .update(State::ReceiveDifficulty {
                    topic: topic.to_string(),
                    session,
                })
                .await?;
            Ok(())
        }
    }
}

async fn receive_difficulty(
    helper: Helper,
    bot: Bot,
    dialogue: QuizDialogue,
    (topic, session): (String, QuizSession),
    msg: Message,
) -> HandlerResult {
    let difficulty = match msg.text().map(str::trim) {
        Some(ANY_DIFFICULTY) => None,
        Some(text) => match text.parse::<Difficulty>() {
            Ok(difficulty) => Some(difficulty),
            Err(_) => {
                bot.send_message(msg.chat.id, "Please choose one of the options")
                    .await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            return Ok(());
        }
    };

    // Busy indicator only, errors ignored
    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;
    bot.send_message(msg.chat.id, "Generating MCQs...")
        .reply_markup(KeyboardRemove::new())
        .await?;

    let mut session = session;
    let failure = match helper.generate_questions(&topic, difficulty).await {
        Ok(questions) if questions.is_empty() => {
            Some("The model's answer contained no usable questions. Please try again.".to_string())
        }
        Ok(questions) => {
            session.load(questions);
            None
        }
        Err(err) => {
            if matches!(err, QuizError::ModelRequest(_)) {
                log::error!("Error generating MCQs: {}", err);
            }
            Some(render::generation_error(&err))
        }
    };

    // The previous quiz stays in place unless generation succeeded.
    dialogue
        .update(State::ReceiveTopic {
            session: session.clone(),
        })
        .await?;

    match failure {
        Some(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
        }
        None => send_quiz(&bot, msg.chat.id, &topic, difficulty, &session).await?,
    }

    bot.send_message(
        msg.chat.id,
        "Send another topic whenever you want a new quiz, or /score for your results.",
    )
    .await?;
    Ok(())
}

async fn send_quiz(
    bot: &Bot,
    chat_id: ChatId,
    topic: &str,
    difficulty: Option<Difficulty>,
    session: &QuizSession,
) -> HandlerResult {
    bot.send_message(
        chat_id,
        render::quiz_header(topic, difficulty, session.len()),
    )
    .await?;

    for (i, question) in session.questions().iter().enumerate() {
        let index = i + 1;
        let buttons = Label::ALL.map(|label| {
            InlineKeyboardButton::callback(
                label.to_string(),
                render::callback_data(session.round(), index, label),
            )
        });

        bot.send_message(chat_id, render::question_text(index, question))
            .reply_markup(InlineKeyboardMarkup::new([buttons]))
            .await?;
    }
    Ok(())
}

async fn receive_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    mut state: State,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some((round, index, label)) = q.data.as_deref().and_then(render::parse_callback_data)
    else {
        log::warn!("Ignoring unknown callback data: {:?}", q.data);
        return Ok(());
    };

    let Some(session) = state.session_mut().filter(|s| s.round() == round) else {
        bot.send_message(
            dialogue.chat_id(),
            "This question belongs to an earlier quiz. Enter a topic to start a new one.",
        )
        .await?;
        return Ok(());
    };

    let outcome = match session.answer_raw(index, label) {
        Ok(outcome) => outcome,
        Err(err) => {
            log::warn!("Rejected answer: {}", err);
            return Ok(());
        }
    };
    let Some(question) = session.question(index) else {
        return Ok(());
    };
    let reply = format!(
        "Q{}: {}\n{}",
        index,
        render::feedback(outcome, question.correct_label()),
        render::score_line(session.score())
    );

    dialogue.update(state).await?;
    bot.send_message(dialogue.chat_id(), reply).await?;
    Ok(())
}
