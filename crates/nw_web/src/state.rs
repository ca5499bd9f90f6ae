use nw_proxy::ProxyService;

pub struct AppState {
    pub proxy: ProxyService,
}

impl AppState {
    pub fn new(proxy: ProxyService) -> Self {
        Self { proxy }
    }
}
