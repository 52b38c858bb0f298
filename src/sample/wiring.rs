//! Application configuration: the only place that knows concrete types.

use std::sync::Arc;

use super::discount::{DiscountPolicy, FixDiscountPolicy, RateDiscountPolicy};
use super::member::{MemberRepository, MemberService, MemberServiceImpl, MemoryMemberRepository};
use super::network::NetworkClient;
use super::order::{OrderService, OrderServiceImpl};
use super::request_log::{LogDemoService, RequestLog};
use crate::container::Container;
use crate::definition::{BeanDefinition, BeanDefinitionBuilder, DefinitionSource};
use crate::error::DiResult;

/// Name of the contextual scope opened around each request.
pub const REQUEST_SCOPE: &str = "request";

/// Url the sample network client connects to.
pub const NETWORK_URL: &str = "http://hello-spring.dev";

pub fn member_repository(id: &str) -> BeanDefinitionBuilder<MemoryMemberRepository> {
    BeanDefinition::builder::<MemoryMemberRepository>(id)
        .provides::<dyn MemberRepository>(|bean| bean as Arc<dyn MemberRepository>)
}

pub fn member_service(id: &str) -> BeanDefinitionBuilder<MemberServiceImpl> {
    BeanDefinition::builder::<MemberServiceImpl>(id)
        .provides::<dyn MemberService>(|bean| bean as Arc<dyn MemberService>)
        .depends_on::<dyn MemberRepository>()
}

pub fn fix_discount_policy(id: &str) -> BeanDefinitionBuilder<FixDiscountPolicy> {
    BeanDefinition::builder::<FixDiscountPolicy>(id)
        .provides::<dyn DiscountPolicy>(|bean| bean as Arc<dyn DiscountPolicy>)
}

pub fn rate_discount_policy(id: &str) -> BeanDefinitionBuilder<RateDiscountPolicy> {
    BeanDefinition::builder::<RateDiscountPolicy>(id)
        .provides::<dyn DiscountPolicy>(|bean| bean as Arc<dyn DiscountPolicy>)
}

pub fn order_service(id: &str) -> BeanDefinitionBuilder<OrderServiceImpl> {
    BeanDefinition::builder::<OrderServiceImpl>(id)
        .provides::<dyn OrderService>(|bean| bean as Arc<dyn OrderService>)
        .depends_on::<dyn MemberRepository>()
        .depends_on::<dyn DiscountPolicy>()
}

pub fn request_log(id: &str) -> BeanDefinitionBuilder<RequestLog> {
    BeanDefinition::builder::<RequestLog>(id)
        .contextual(REQUEST_SCOPE)
        .init_hook("init", RequestLog::init)
        .destroy_hook("close", RequestLog::close)
}

pub fn log_demo_service(id: &str) -> BeanDefinitionBuilder<LogDemoService> {
    BeanDefinition::builder::<LogDemoService>(id).proxied::<RequestLog>()
}

pub fn network_client(id: &str) -> BeanDefinitionBuilder<NetworkClient> {
    BeanDefinition::builder::<NetworkClient>(id)
        .init_hook("init", NetworkClient::init)
        .destroy_hook("close", NetworkClient::close)
}

/// Registers the whole sample application with explicit ids.
///
/// `rateDiscountPolicy` is primary, so `dyn DiscountPolicy` resolves to it
/// unless a qualifier asks for `fixDiscountPolicy`.
pub fn register_app(container: &Container) -> DiResult<()> {
    register_all(container, DefinitionSource::Manual, "memberRepository")
}

/// Registers the application the way a component scan would, then overrides
/// the scanned repository with a manual definition of the same id.
///
/// Fails with `DuplicateId` unless the container allows definition
/// overriding.
pub fn register_scanned_app(container: &Container) -> DiResult<()> {
    register_all(container, DefinitionSource::Scanned, "memoryMemberRepository")?;
    container.register(
        member_repository("memoryMemberRepository")
            .factory(|_| Ok(MemoryMemberRepository::new())),
    )
}

fn register_all(container: &Container, source: DefinitionSource, repository_id: &str) -> DiResult<()> {
    container.register(
        member_repository(repository_id)
            .source(source)
            .factory(|_| Ok(MemoryMemberRepository::new())),
    )?;
    container.register(
        member_service("memberService")
            .source(source)
            .factory(|deps| Ok(MemberServiceImpl::new(deps.bean::<dyn MemberRepository>(0)?))),
    )?;
    container.register(
        fix_discount_policy("fixDiscountPolicy")
            .source(source)
            .factory(|_| Ok(FixDiscountPolicy)),
    )?;
    container.register(
        rate_discount_policy("rateDiscountPolicy")
            .source(source)
            .primary()
            .factory(|_| Ok(RateDiscountPolicy)),
    )?;
    container.register(
        order_service("orderService")
            .source(source)
            .factory(|deps| {
                Ok(OrderServiceImpl::new(
                    deps.bean::<dyn MemberRepository>(0)?,
                    deps.bean::<dyn DiscountPolicy>(1)?,
                ))
            }),
    )?;
    container.register(
        request_log("requestLog")
            .source(source)
            .factory(|_| Ok(RequestLog::new())),
    )?;
    container.register(
        log_demo_service("logDemoService")
            .source(source)
            .factory(|deps| Ok(LogDemoService::new(deps.proxy::<RequestLog>(0)?))),
    )?;
    container.register(
        network_client("networkClient")
            .source(source)
            .factory(|_| Ok(NetworkClient::new(NETWORK_URL))),
    )
}
