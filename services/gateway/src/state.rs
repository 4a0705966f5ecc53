use crate::auth::TokenIssuer;
use reservation::ReservationService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: ReservationService,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(service: ReservationService, tokens: TokenIssuer) -> Self {
        Self {
            service,
            tokens: Arc::new(tokens),
        }
    }
}
