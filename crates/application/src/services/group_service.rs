//! 小组服务
//!
//! 小组的创建、加入、退出、排名与搜索。每个操作先并发发起相互独立的
//! 读取（join-all、fail-fast），全部就绪后再做规则判定，需要原子性的
//! 写入交给仓储的复合事务方法。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use domain::{
    AuthUser, DomainError, Group, GroupId, GroupMember, GroupScore, MembershipId, UserId,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{
        CreateGroupRequest, CreateGroupResponse, GetGroupRanksResponse, GetGroupResponse,
        GroupRankEntry, JoinGroupResponse, PageRequest, PageResponse, SearchGroupResponse,
    },
    error::ApplicationError,
    events::{GroupEvent, GroupEventBus},
    repository::{GroupMemberRepository, GroupRepository, GroupScoreRepository, UserRepository},
};

/// 公开小组详情里附带的排名条数
const GROUP_TOP_RANKS: usize = 5;

pub struct GroupServiceDependencies {
    pub group_repository: Arc<dyn GroupRepository>,
    pub member_repository: Arc<dyn GroupMemberRepository>,
    pub score_repository: Arc<dyn GroupScoreRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub event_bus: GroupEventBus,
}

pub struct GroupService {
    deps: GroupServiceDependencies,
}

impl GroupService {
    pub fn new(deps: GroupServiceDependencies) -> Self {
        Self { deps }
    }

    /// 创建小组。名称冲突与重复加入两个前置条件并发检查，
    /// 名称冲突优先报告。
    pub async fn create_group(
        &self,
        user: &AuthUser,
        request: CreateGroupRequest,
    ) -> Result<CreateGroupResponse, ApplicationError> {
        let (exists_by_name, memberships) = tokio::try_join!(
            async {
                self.deps
                    .group_repository
                    .exists_by_name(&request.name)
                    .await
                    .map_err(ApplicationError::from)
            },
            async {
                self.deps
                    .member_repository
                    .find_all_by_uid(user.uid)
                    .await
                    .map_err(ApplicationError::from)
            },
        )?;

        if exists_by_name {
            return Err(DomainError::DuplicateGroupName.into());
        }
        if !memberships.is_empty() {
            return Err(DomainError::DuplicateGroupJoin.into());
        }

        let now = self.deps.clock.now();
        let group = Group::create(
            GroupId::from(Uuid::new_v4()),
            request.name,
            request.description,
            user.uid,
            request.is_hidden,
            request.join_code,
            request.user_capacity,
            now,
        )?;

        let created = self.deps.group_repository.create(group).await?;

        self.deps.event_bus.publish(GroupEvent::Created {
            group: created.clone(),
        });

        info!(group_id = %created.id, owner = %created.owner_uid, "小组创建成功");
        Ok(CreateGroupResponse::from(&created))
    }

    /// 小组创建事件的后续：补建组长的成员记录。
    /// 创建时成员数已经是 1，这里只插入记录，不再改计数。
    pub async fn attach_owner_membership(
        &self,
        group: &Group,
    ) -> Result<GroupMember, ApplicationError> {
        if let Some(existing) = self
            .deps
            .member_repository
            .find(group.id, group.owner_uid)
            .await?
        {
            return Ok(existing);
        }

        let member = GroupMember::new(
            MembershipId::from(Uuid::new_v4()),
            group.id,
            group.owner_uid,
            self.deps.clock.now(),
        );
        let created = self.deps.member_repository.insert(member).await?;

        info!(group_id = %group.id, uid = %group.owner_uid, "组长成员记录已补建");
        Ok(created)
    }

    /// 加入小组。重复加入同一小组是幂等成功，返回既有记录的标识。
    pub async fn join_group(
        &self,
        group_id: GroupId,
        uid: UserId,
        join_code: Option<String>,
    ) -> Result<JoinGroupResponse, ApplicationError> {
        let (group, member_count, memberships) = tokio::try_join!(
            self.find_group(group_id),
            async {
                self.deps
                    .member_repository
                    .count_by_group(group_id)
                    .await
                    .map_err(ApplicationError::from)
            },
            async {
                self.deps
                    .member_repository
                    .find_all_by_uid(uid)
                    .await
                    .map_err(ApplicationError::from)
            },
        )?;

        // 跨组互斥不变量下每个用户至多一条记录
        let membership_by_group: HashMap<GroupId, GroupMember> = memberships
            .into_iter()
            .map(|member| (member.group_id, member))
            .collect();

        if !group.join_code_matches(join_code.as_deref()) {
            return Err(DomainError::ImpossibleToJoin.into());
        }

        match membership_by_group.get(&group_id) {
            // 已加入其他小组
            None if !membership_by_group.is_empty() => {
                Err(DomainError::DuplicateGroupJoin.into())
            }

            // 已是本组成员，幂等返回
            Some(member) => Ok(JoinGroupResponse {
                group_id: group.id,
                uid: member.uid,
                group_user_id: member.id,
            }),

            None => {
                if member_count >= group.user_capacity as u64 {
                    return Err(DomainError::ExceedGroupUserCount.into());
                }

                let now = self.deps.clock.now();
                let mut group = group;
                group.admit_member(now)?;

                let member =
                    GroupMember::new(MembershipId::from(Uuid::new_v4()), group_id, uid, now);

                // 事务内会按最新成员数重查一次容量，并发加入者只有一个能提交
                let created = self
                    .deps
                    .group_repository
                    .save_with_new_member(group, member)
                    .await
                    .map_err(|err| match err {
                        domain::RepositoryError::Conflict => {
                            ApplicationError::Domain(DomainError::ExceedGroupUserCount)
                        }
                        other => ApplicationError::Repository(other),
                    })?;

                info!(group_id = %group_id, uid = %uid, "用户加入小组");
                Ok(JoinGroupResponse {
                    group_id,
                    uid: created.uid,
                    group_user_id: created.id,
                })
            }
        }
    }

    /// 退出小组。组长退出时由加入最早的其他成员继任；
    /// 没有其他成员则整组删除。
    pub async fn withdraw(&self, uid: UserId, group_id: GroupId) -> Result<(), ApplicationError> {
        let (group, membership) = tokio::try_join!(self.find_group(group_id), async {
            self.deps
                .member_repository
                .find(group_id, uid)
                .await
                .map_err(ApplicationError::from)?
                .ok_or(ApplicationError::Domain(DomainError::MembershipNotFound))
        })?;

        let now = self.deps.clock.now();

        if group.is_owner(uid) {
            let successor = self
                .deps
                .member_repository
                .find_first_joined_excluding(group_id, uid)
                .await?;

            match successor {
                // 最后一名成员退出，小组一并删除
                None => {
                    self.deps
                        .group_repository
                        .delete_with_member(group.id, membership.id)
                        .await?;
                    info!(group_id = %group_id, "组长退出，小组已删除");
                }
                Some(next_owner) => {
                    let mut group = group;
                    group.transfer_owner(next_owner.uid, now);
                    group.release_member(now);
                    self.deps
                        .group_repository
                        .save_with_removed_member(group, membership.id)
                        .await?;
                    info!(
                        group_id = %group_id,
                        new_owner = %next_owner.uid,
                        "组长退出，所有权已移交"
                    );
                }
            }
        } else {
            let mut group = group;
            group.release_member(now);
            self.deps
                .group_repository
                .save_with_removed_member(group, membership.id)
                .await?;
            info!(group_id = %group_id, uid = %uid, "成员退出小组");
        }

        Ok(())
    }

    /// 组长移除成员。非组长得到的也是 NotFound，不泄露小组存在性。
    pub async fn delete_group_member(
        &self,
        user: &AuthUser,
        membership_id: MembershipId,
    ) -> Result<(), ApplicationError> {
        let membership = self
            .deps
            .member_repository
            .find_by_id(membership_id)
            .await?
            .ok_or(DomainError::MembershipNotFound)?;

        let group = self
            .deps
            .group_repository
            .find_by_id_and_owner(membership.group_id, user.uid)
            .await?
            .ok_or(DomainError::GroupNotFound)?;

        let mut group = group;
        group.release_member(self.deps.clock.now());
        self.deps
            .group_repository
            .save_with_removed_member(group, membership.id)
            .await?;

        info!(
            membership_id = %membership_id,
            operator = %user.uid,
            "组长移除成员"
        );
        Ok(())
    }

    /// 小组详情。加入码仅组长可见；公开小组附带前五名排名，
    /// 名称或成员记录解析失败的条目按尽力而为原则丢弃。
    pub async fn get_group(
        &self,
        user: &AuthUser,
        group_id: GroupId,
    ) -> Result<GetGroupResponse, ApplicationError> {
        let (group, scores) = tokio::try_join!(self.find_group(group_id), async {
            self.deps
                .score_repository
                .find_all_by_group(group_id)
                .await
                .map_err(ApplicationError::from)
        })?;

        let top_scores: Vec<GroupScore> = ranked_ascending(scores)
            .into_iter()
            .take(GROUP_TOP_RANKS)
            .collect();

        let owner = self
            .deps
            .user_repository
            .find_by_id(group.owner_uid)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let join_code = if group.is_owner(user.uid) {
            group.join_code.clone()
        } else {
            None
        };

        let ranks = if group.is_hidden {
            None
        } else {
            Some(self.resolve_ranks(group_id, &top_scores, true).await?)
        };

        Ok(GetGroupResponse {
            id: group.id,
            name: group.name,
            description: group.description,
            owner_uid: group.owner_uid,
            owner_name: owner.nickname.as_str().to_owned(),
            is_hidden: group.is_hidden,
            join_code,
            user_count: group.user_count,
            user_capacity: group.user_capacity,
            ranks,
        })
    }

    /// 完整排名，仅小组成员可见。未参与排名（得分为空）的成员不出现。
    pub async fn get_group_rank(
        &self,
        user: &AuthUser,
        group_id: GroupId,
    ) -> Result<GetGroupRanksResponse, ApplicationError> {
        let membership = self
            .deps
            .member_repository
            .find(group_id, user.uid)
            .await?
            .ok_or(DomainError::NotGroupMember)?;

        let scores = self
            .deps
            .score_repository
            .find_all_by_group(group_id)
            .await?;
        let ranked = ranked_ascending(scores);

        let ranks = self.resolve_ranks(group_id, &ranked, false).await?;

        Ok(GetGroupRanksResponse {
            group_id: membership.group_id,
            ranks,
        })
    }

    /// 分页搜索所有小组，并标注调用者是否已加入每个小组。
    pub async fn search_group(
        &self,
        user: &AuthUser,
        page: PageRequest,
    ) -> Result<PageResponse<SearchGroupResponse>, ApplicationError> {
        let page = page.normalized();
        let (groups, total) = self.deps.group_repository.find_page(page).await?;

        let group_ids: Vec<GroupId> = groups.iter().map(|group| group.id).collect();
        let joined: HashSet<GroupId> = self
            .deps
            .member_repository
            .find_by_uid_and_group_ids(user.uid, &group_ids)
            .await?
            .into_iter()
            .map(|member| member.group_id)
            .collect();

        let content = groups
            .iter()
            .map(|group| SearchGroupResponse::from_group(group, joined.contains(&group.id)))
            .collect();

        Ok(PageResponse::new(content, page, total))
    }

    /// 建组前的名称可用性检查。
    pub async fn check_group_name(&self, name: &str) -> Result<(), ApplicationError> {
        if self.deps.group_repository.exists_by_name(name).await? {
            return Err(DomainError::DuplicateGroupName.into());
        }
        Ok(())
    }

    async fn find_group(&self, group_id: GroupId) -> Result<Group, ApplicationError> {
        self.deps
            .group_repository
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound.into())
    }

    /// 把得分序列解析为带名次的条目。用户或成员记录缺失的条目跳过，
    /// 名次只对成功发出的条目递增。
    async fn resolve_ranks(
        &self,
        group_id: GroupId,
        scores: &[GroupScore],
        zero_for_unranked: bool,
    ) -> Result<Vec<GroupRankEntry>, ApplicationError> {
        if scores.is_empty() {
            return Ok(Vec::new());
        }

        let uids: Vec<UserId> = scores.iter().map(|score| score.uid).collect();

        let (users, members) = tokio::try_join!(
            async {
                self.deps
                    .user_repository
                    .find_all_by_ids(&uids)
                    .await
                    .map_err(ApplicationError::from)
            },
            async {
                self.deps
                    .member_repository
                    .find_all_by_group_and_uids(group_id, &uids)
                    .await
                    .map_err(ApplicationError::from)
            },
        )?;

        let member_by_uid: HashMap<UserId, GroupMember> = members
            .into_iter()
            .map(|member| (member.uid, member))
            .collect();

        let mut rank = 1u32;
        let mut entries = Vec::with_capacity(scores.len());
        for score in scores {
            let (Some(member), Some(info)) = (member_by_uid.get(&score.uid), users.get(&score.uid))
            else {
                continue;
            };
            let value = match (score.score, zero_for_unranked) {
                (Some(value), _) => value,
                (None, true) => 0,
                (None, false) => continue,
            };
            entries.push(GroupRankEntry {
                group_user_id: member.id,
                name: info.nickname.as_str().to_owned(),
                rank,
                score: value,
            });
            rank += 1;
        }

        Ok(entries)
    }
}

/// 过滤掉未参与排名的得分并按分值升序排列（低分在前），
/// 相同分值保持输入顺序。
fn ranked_ascending(mut scores: Vec<GroupScore>) -> Vec<GroupScore> {
    scores.retain(GroupScore::is_ranked);
    scores.sort_by_key(|score| score.score);
    scores
}
